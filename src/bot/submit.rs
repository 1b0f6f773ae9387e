//! Builds the application report and fans it out to administrators.

use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};
use tracing::{info, warn};

use crate::bot::flow::{JOB_LABEL, NAME_LABEL, VIDEO_ANSWER_LABEL, VOICE_ANSWER_LABEL};
use crate::store::Storage;

pub fn answer_value<'a>(answers: &'a [(String, String)], label: &str) -> Option<&'a str> {
    answers
        .iter()
        .find(|(k, _)| k == label)
        .map(|(_, v)| v.as_str())
}

/// Report text: requestor header, pinned name and job lines, then every
/// remaining answer in capture order.
pub fn build_report(user_id: i64, answers: &[(String, String)]) -> String {
    let mut lines = vec![format!("📝 Yangi ariza #{user_id}")];
    lines.push(format!("{NAME_LABEL}: {}", answer_value(answers, NAME_LABEL).unwrap_or("")));
    lines.push(format!("{JOB_LABEL}: {}", answer_value(answers, JOB_LABEL).unwrap_or("")));
    for (label, value) in answers {
        if label == NAME_LABEL || label == JOB_LABEL {
            continue;
        }
        lines.push(format!("{label}: {value}"));
    }
    lines.join("\n")
}

/// Best-effort fan-out to the current admin snapshot. A failing recipient
/// is logged and skipped; nothing propagates back to the applicant.
pub async fn dispatch(bot: &Bot, storage: &Storage, user_id: i64, answers: &[(String, String)]) {
    let report = build_report(user_id, answers);
    let voice = answer_value(answers, VOICE_ANSWER_LABEL);
    let video = answer_value(answers, VIDEO_ANSWER_LABEL);

    let admins = storage.admins();
    info!("Submitting application from {user_id} to {} admin(s)", admins.len());

    for admin in admins {
        let chat = ChatId(admin);
        if let Err(e) = bot.send_message(chat, &report).await {
            warn!("Failed to deliver report to admin {admin}: {e}");
            continue;
        }
        if let Some(file_id) = voice {
            if let Err(e) = bot
                .send_voice(chat, InputFile::file_id(FileId(file_id.to_string())))
                .await
            {
                warn!("Failed to forward voice answer to admin {admin}: {e}");
            }
        }
        if let Some(file_id) = video {
            if let Err(e) = bot
                .send_video(chat, InputFile::file_id(FileId(file_id.to_string())))
                .await
            {
                warn!("Failed to forward video answer to admin {admin}: {e}");
            }
        }
    }
}
