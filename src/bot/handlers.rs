//! Telegram endpoints: messages, inline selections, and admin commands.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, KeyboardRemove, MessageId};
use tracing::{debug, info, warn};

use crate::bot::flow::{self, FlowContext, FormEvent, FormState, Prompt, Session, StepOutcome};
use crate::bot::keyboards;
use crate::bot::submit;
use crate::BotState;

const CANCELLED_TEXT: &str = "Bekor qilindi. /start dan qayta boshlang.";
const SUBMITTED_TEXT: &str = "Ma'lumotlaringiz qabul qilindi. Tez orada xabarini beramiz!";
const REPLY_TO_VIDEO_TEXT: &str = "Ushbu buyruqni video xabariga javoban yuboring (reply).";
const REPLY_TO_VOICE_TEXT: &str = "Ushbu buyruqni OVOZ xabariga javoban yuboring (reply).";

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if msg.text().is_some_and(|t| t.starts_with('/'))
        && handle_command(&bot, &msg, &state).await
    {
        return Ok(());
    }

    let Some(event) = event_from_message(&msg) else {
        return Ok(());
    };
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    run_step(&bot, &state, msg.chat.id, user_id, event).await;
    Ok(())
}

pub async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await.ok();

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some((prefix, value)) = data.split_once(':') else {
        debug!("Unparseable callback data: {data:?}");
        return Ok(());
    };
    let Some(message) = q.regular_message() else {
        return Ok(());
    };

    let event = FormEvent::Selection {
        prefix: prefix.to_string(),
        value: value.to_string(),
    };
    run_step(&bot, &state, message.chat.id, q.from.id.0 as i64, event).await;
    Ok(())
}

/// Feed one event to the chat's session and execute the outcome. Chats with
/// no active session ignore everything except commands.
async fn run_step(bot: &Bot, state: &Arc<BotState>, chat_id: ChatId, user_id: i64, event: FormEvent) {
    let media = state.storage.media();
    let ctx = FlowContext {
        media: &media,
        job_types: &state.config.job_types,
    };

    let (outcome, answers) = {
        let mut sessions = state.sessions.lock().await;
        let Some(session) = sessions.get_mut(&chat_id) else {
            debug!("No active session for chat {chat_id}, dropping input");
            return;
        };
        let outcome = session.apply(&event, &ctx);
        let answers = match outcome {
            StepOutcome::Completed => {
                let answers = session.answers().to_vec();
                sessions.remove(&chat_id);
                Some(answers)
            }
            _ => None,
        };
        (outcome, answers)
    };

    match outcome {
        StepOutcome::Advance { delete, prompts } => {
            if let Some(msg_id) = delete
                && let Err(e) = bot.delete_message(chat_id, MessageId(msg_id)).await
            {
                debug!("Failed to delete prompt message {msg_id}: {e}");
            }
            for prompt in prompts {
                send_prompt(bot, chat_id, prompt).await;
            }
        }
        StepOutcome::Reprompt(text) => {
            if let Err(e) = bot.send_message(chat_id, text).await {
                warn!("Failed to send re-prompt: {e}");
            }
        }
        StepOutcome::Completed => {
            let answers = answers.unwrap_or_default();
            submit::dispatch(bot, &state.storage, user_id, &answers).await;
            if let Err(e) = bot.send_message(chat_id, SUBMITTED_TEXT).await {
                warn!("Failed to send submission acknowledgement: {e}");
            }
            info!("Questionnaire completed for chat {chat_id}");
        }
        StepOutcome::Ignored => {}
    }
}

/// Routes slash commands. Returns false for unknown commands so they fall
/// through to the flow as ordinary text.
async fn handle_command(bot: &Bot, msg: &Message, state: &Arc<BotState>) -> bool {
    let text = msg.text().unwrap_or("");
    let mut parts = text.split_whitespace();
    let head = parts.next().unwrap_or("");
    // Strip a "@botname" suffix
    let command = head.split('@').next().unwrap_or(head);
    let args: Vec<&str> = parts.collect();

    match command {
        "/start" => start(bot, msg, state).await,
        "/cancel" => cancel(bot, msg, state).await,
        "/set_intro_video" => set_media(bot, msg, state, MediaField::IntroVideo).await,
        "/set_voice_prompt" => set_media(bot, msg, state, MediaField::VoicePrompt).await,
        "/set_russian_video" => set_media(bot, msg, state, MediaField::RussianVideo).await,
        "/add_admin" => add_admin(bot, msg, state, &args).await,
        "/remove_admin" => remove_admin(bot, msg, state, &args).await,
        _ => return false,
    }
    true
}

/// Begin (or silently restart) the questionnaire.
async fn start(bot: &Bot, msg: &Message, state: &Arc<BotState>) {
    let chat_id = msg.chat.id;
    let media = state.storage.media();

    // Intro video is fire-and-forget
    if let Some(ref file_id) = media.intro_video_file_id
        && let Err(e) = bot
            .send_video(chat_id, InputFile::file_id(FileId(file_id.clone())))
            .await
    {
        warn!("Failed to send intro video: {e}");
    }

    let ctx = FlowContext {
        media: &media,
        job_types: &state.config.job_types,
    };
    let mut session = Session::new();
    for prompt in flow::entry_prompts(FormState::ChooseJob, &ctx) {
        session.intro_msg_id = send_prompt(bot, chat_id, prompt).await.map(|id| id.0);
    }
    state.sessions.lock().await.insert(chat_id, session);
    info!("Questionnaire started for chat {chat_id}");
}

async fn cancel(bot: &Bot, msg: &Message, state: &Arc<BotState>) {
    state.sessions.lock().await.remove(&msg.chat.id);
    if let Err(e) = bot
        .send_message(msg.chat.id, CANCELLED_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await
    {
        warn!("Failed to send cancellation notice: {e}");
    }
    info!("Session cancelled for chat {}", msg.chat.id);
}

enum MediaField {
    IntroVideo,
    VoicePrompt,
    RussianVideo,
}

/// Store a prompt media reference from the replied-to message. Admin only;
/// a missing or wrong-typed reply gets a corrective instruction.
async fn set_media(bot: &Bot, msg: &Message, state: &Arc<BotState>, field: MediaField) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };
    if !state.storage.is_admin(user.id.0 as i64) {
        debug!("Ignoring media command from non-admin {}", user.id);
        return;
    }

    let reply = msg.reply_to_message();
    let (file_id, corrective) = match field {
        MediaField::VoicePrompt => (
            reply.and_then(|r| r.voice()).map(|v| v.file.id.0.clone()),
            REPLY_TO_VOICE_TEXT,
        ),
        MediaField::IntroVideo | MediaField::RussianVideo => {
            (reply.and_then(video_file_id), REPLY_TO_VIDEO_TEXT)
        }
    };
    let Some(file_id) = file_id else {
        send_text(bot, msg.chat.id, corrective).await;
        return;
    };

    let confirmation = match field {
        MediaField::IntroVideo => {
            state.storage.set_intro_video(file_id);
            "Intro video yangilandi. ✅"
        }
        MediaField::VoicePrompt => {
            state.storage.set_voice_prompt(file_id);
            "Ovozli savol yangilandi. ✅"
        }
        MediaField::RussianVideo => {
            state.storage.set_russian_video(file_id);
            "Rus tili uchun video savol yangilandi. ✅"
        }
    };
    send_text(bot, msg.chat.id, confirmation).await;
}

async fn add_admin(bot: &Bot, msg: &Message, state: &Arc<BotState>, args: &[&str]) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };
    if !state.storage.is_main_admin(user.id.0 as i64) {
        return;
    }
    let Some(id) = parse_admin_id(args) else {
        send_text(bot, msg.chat.id, "Foydalanish: /add_admin 123456789").await;
        return;
    };
    state.storage.add_admin(id);
    info!("Admin {id} added by main admin");
    send_text(bot, msg.chat.id, &format!("Admin qo'shildi: {id} ✅")).await;
}

async fn remove_admin(bot: &Bot, msg: &Message, state: &Arc<BotState>, args: &[&str]) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };
    if !state.storage.is_main_admin(user.id.0 as i64) {
        return;
    }
    let Some(id) = parse_admin_id(args) else {
        send_text(bot, msg.chat.id, "Foydalanish: /remove_admin 123456789").await;
        return;
    };
    if state.storage.remove_admin(id) {
        info!("Admin {id} removed by main admin");
        send_text(bot, msg.chat.id, &format!("Admin o'chirildi: {id} ✅")).await;
    } else {
        send_text(bot, msg.chat.id, "Bu foydalanuvchini o'chirish mumkin emas.").await;
    }
}

fn parse_admin_id(args: &[&str]) -> Option<i64> {
    match args {
        [id] => id.parse::<u64>().ok().map(|id| id as i64),
        _ => None,
    }
}

fn video_file_id(msg: &Message) -> Option<String> {
    msg.video()
        .map(|v| v.file.id.0.clone())
        .or_else(|| msg.video_note().map(|n| n.file.id.0.clone()))
}

fn event_from_message(msg: &Message) -> Option<FormEvent> {
    if let Some(contact) = msg.contact() {
        return Some(FormEvent::Contact(contact.phone_number.clone()));
    }
    if let Some(voice) = msg.voice() {
        return Some(FormEvent::Voice(voice.file.id.0.clone()));
    }
    if let Some(file_id) = video_file_id(msg) {
        return Some(FormEvent::Video(file_id));
    }
    msg.text().map(|t| FormEvent::Text(t.to_string()))
}

async fn send_text(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        warn!("Failed to send: {e}");
    }
}

/// Execute one prompt. Returns the sent message id where one was produced.
async fn send_prompt(bot: &Bot, chat_id: ChatId, prompt: Prompt) -> Option<MessageId> {
    let result = match prompt {
        Prompt::Text(text) => bot.send_message(chat_id, text).await,
        Prompt::TextRemoveKeyboard(text) => {
            bot.send_message(chat_id, text)
                .reply_markup(KeyboardRemove::new())
                .await
        }
        Prompt::ContactRequest(text) => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboards::contact_keyboard())
                .await
        }
        Prompt::Choices { text, prefix, options } => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboards::inline_from_list(&options, prefix))
                .await
        }
        Prompt::VoicePrompt { file_id, fallback } => {
            if let Some(id) = file_id {
                match bot.send_voice(chat_id, InputFile::file_id(FileId(id))).await {
                    Ok(m) => return Some(m.id),
                    Err(e) => {
                        warn!("Failed to send voice prompt, falling back to text: {e}");
                    }
                }
            }
            bot.send_message(chat_id, fallback).await
        }
        Prompt::VideoPrompt { file_id, fallback } => {
            if let Some(id) = file_id {
                match bot.send_video(chat_id, InputFile::file_id(FileId(id))).await {
                    Ok(m) => return Some(m.id),
                    Err(e) => {
                        warn!("Failed to send video prompt, falling back to text: {e}");
                    }
                }
            }
            bot.send_message(chat_id, fallback).await
        }
    };
    match result {
        Ok(m) => Some(m.id),
        Err(e) => {
            warn!("Failed to send prompt: {e}");
            None
        }
    }
}
