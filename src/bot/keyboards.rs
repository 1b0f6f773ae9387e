//! Keyboard builders for the questionnaire prompts.

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

/// One tappable option per row; callback data is `{prefix}:{option}`.
pub fn inline_from_list(options: &[String], prefix: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        options
            .iter()
            .map(|opt| vec![InlineKeyboardButton::callback(opt.clone(), format!("{prefix}:{opt}"))]),
    )
}

/// One-time reply keyboard with a contact-share button for the phone step.
pub fn contact_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("Telefon raqamni jo'natish").request(ButtonRequest::Contact),
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}
