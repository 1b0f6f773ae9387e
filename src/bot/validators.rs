//! Input validators for freeform answers.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap());

/// True iff `text` is a zero-padded `DD.MM.YYYY` date that exists on the
/// calendar. The shape check comes first so `1.1.2020` is rejected even
/// though chrono would happily parse it.
pub fn is_valid_date(text: &str) -> bool {
    let text = text.trim();
    DATE_SHAPE.is_match(text) && NaiveDate::parse_from_str(text, "%d.%m.%Y").is_ok()
}
