//! The questionnaire state machine.
//!
//! One strictly linear flow: every state records exactly one labeled answer
//! and hands over to exactly one successor. The whole sequence lives in a
//! single descriptor table ([`FLOW`]) interpreted by [`Session::apply`];
//! the per-state differences are only the accepted input kind and the
//! prompt emitted on entry.

use crate::bot::validators::is_valid_date;
use crate::store::MediaConfig;

pub const JOB_LABEL: &str = "Ish turi";
pub const NAME_LABEL: &str = "Ism-familiya";
pub const PHONE_LABEL: &str = "Telefon raqami";
pub const VOICE_ANSWER_LABEL: &str = "Ovozli javob (file_id)";
pub const VIDEO_ANSWER_LABEL: &str = "Video javob (file_id)";

pub const EDUCATION_OPTIONS: &[&str] = &["o'rta", "o'rta maxsus", "oliy"];
pub const MARITAL_OPTIONS: &[&str] = &["turmush qurganman", "turmush qurmaganman", "ajrashganman"];
pub const RUSSIAN_OPTIONS: &[&str] = &["a'lo", "yaxshi", "past", "bilmayman"];
pub const YESNO_OPTIONS: &[&str] = &["ha", "yo'q"];

const BIRTHDAY_REPROMPT: &str = "Tug'ilgan kuningizni 01.01.2000 formatda yozing.";
const VOICE_FALLBACK: &str = "Iltimos, savolga OVOZ xabari bilan javob yuboring.";
const VIDEO_FALLBACK: &str = "Iltimos, VIDEOLI xabar yuboring (video yoki video-note).";

/// Question states, in flow order. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    ChooseJob,
    AskName,
    AskPhone,
    AskAddress,
    AskBirthday,
    AskEducation,
    AskExperience,
    AskMarital,
    WaitVoiceAnswer,
    AskRussian,
    WaitVideoAnswer,
    AskConsent,
    AskReference,
    AskDuration,
    AskOvertime,
    AskHealth,
    AskWhyLate,
    AskWhySteal,
    AskWhyGoodBad,
    AskPrevSalary,
    AskDesiredSalary,
    AskCourses,
    Done,
}

/// What kind of input a state accepts. Anything else is dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Any non-empty text.
    Text,
    /// Text passing `is_valid_date`; invalid text gets a corrective re-prompt.
    Date,
    /// A contact share or any non-empty text.
    TextOrContact,
    /// Inline selection whose payload is one of the listed options.
    Choice { prefix: &'static str, options: &'static [&'static str] },
    /// Inline selection from the configured job list.
    JobChoice,
    /// A voice attachment.
    Voice,
    /// A video or video-note attachment.
    Video,
}

/// One row of the flow table.
pub struct StateSpec {
    pub state: FormState,
    /// Label under which the accepted value is recorded.
    pub label: &'static str,
    pub expects: Expect,
    pub next: FormState,
}

/// The full questionnaire, in order.
pub const FLOW: &[StateSpec] = &[
    StateSpec { state: FormState::ChooseJob, label: JOB_LABEL, expects: Expect::JobChoice, next: FormState::AskName },
    StateSpec { state: FormState::AskName, label: NAME_LABEL, expects: Expect::Text, next: FormState::AskPhone },
    StateSpec { state: FormState::AskPhone, label: PHONE_LABEL, expects: Expect::TextOrContact, next: FormState::AskAddress },
    StateSpec { state: FormState::AskAddress, label: "Manzil (propiska)", expects: Expect::Text, next: FormState::AskBirthday },
    StateSpec { state: FormState::AskBirthday, label: "Tug'ilgan sana", expects: Expect::Date, next: FormState::AskEducation },
    StateSpec { state: FormState::AskEducation, label: "Ma'lumoti", expects: Expect::Choice { prefix: "edu", options: EDUCATION_OPTIONS }, next: FormState::AskExperience },
    StateSpec { state: FormState::AskExperience, label: "Ish tajribasi", expects: Expect::Text, next: FormState::AskMarital },
    StateSpec { state: FormState::AskMarital, label: "Oilaviy holat", expects: Expect::Choice { prefix: "marital", options: MARITAL_OPTIONS }, next: FormState::WaitVoiceAnswer },
    StateSpec { state: FormState::WaitVoiceAnswer, label: VOICE_ANSWER_LABEL, expects: Expect::Voice, next: FormState::AskRussian },
    StateSpec { state: FormState::AskRussian, label: "Rus tili darajasi", expects: Expect::Choice { prefix: "ru", options: RUSSIAN_OPTIONS }, next: FormState::WaitVideoAnswer },
    StateSpec { state: FormState::WaitVideoAnswer, label: VIDEO_ANSWER_LABEL, expects: Expect::Video, next: FormState::AskConsent },
    StateSpec { state: FormState::AskConsent, label: "Surishtirish roziligi", expects: Expect::Choice { prefix: "yn", options: YESNO_OPTIONS }, next: FormState::AskReference },
    StateSpec { state: FormState::AskReference, label: "Tavsiyanoma beruvchi", expects: Expect::Text, next: FormState::AskDuration },
    StateSpec { state: FormState::AskDuration, label: "Qancha muddat ishlamoqchi", expects: Expect::Text, next: FormState::AskOvertime },
    StateSpec { state: FormState::AskOvertime, label: "Ishdan keyin qolishga rozilik", expects: Expect::Text, next: FormState::AskHealth },
    StateSpec { state: FormState::AskHealth, label: "Sog'liq holati", expects: Expect::Text, next: FormState::AskWhyLate },
    StateSpec { state: FormState::AskWhyLate, label: "Nega kech kelishadi", expects: Expect::Text, next: FormState::AskWhySteal },
    StateSpec { state: FormState::AskWhySteal, label: "Nega o'g'rilik qilishadi", expects: Expect::Text, next: FormState::AskWhyGoodBad },
    StateSpec { state: FormState::AskWhyGoodBad, label: "Yaxshi-yomon ish sababi", expects: Expect::Text, next: FormState::AskPrevSalary },
    StateSpec { state: FormState::AskPrevSalary, label: "Oldingi maosh", expects: Expect::Text, next: FormState::AskDesiredSalary },
    StateSpec { state: FormState::AskDesiredSalary, label: "Kutilgan maosh", expects: Expect::Text, next: FormState::AskCourses },
    StateSpec { state: FormState::AskCourses, label: "Kurslar", expects: Expect::Text, next: FormState::Done },
];

pub fn spec_for(state: FormState) -> Option<&'static StateSpec> {
    FLOW.iter().find(|s| s.state == state)
}

/// An inbound user event, already stripped of transport details.
#[derive(Debug, Clone)]
pub enum FormEvent {
    Text(String),
    /// Shared contact's phone number.
    Contact(String),
    /// Inline button press, `{prefix}:{value}` already split.
    Selection { prefix: String, value: String },
    /// Voice attachment file id.
    Voice(String),
    /// Video or video-note attachment file id.
    Video(String),
}

/// An outbound prompt, executed by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Text(String),
    /// Text that also removes any active reply keyboard.
    TextRemoveKeyboard(String),
    /// Text with an inline option keyboard.
    Choices { text: String, prefix: &'static str, options: Vec<String> },
    /// Text with the contact-share reply keyboard.
    ContactRequest(String),
    /// Stored voice prompt; `fallback` text is sent when the reference is
    /// absent or the send fails.
    VoicePrompt { file_id: Option<String>, fallback: String },
    /// Stored video prompt with the same fallback rule.
    VideoPrompt { file_id: Option<String>, fallback: String },
}

/// Result of feeding one event to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Input accepted: delete the given message id (if any), send the
    /// prompts for the next state.
    Advance { delete: Option<i32>, prompts: Vec<Prompt> },
    /// Input rejected with a corrective message. Birthday only.
    Reprompt(String),
    /// The questionnaire is complete; answers are ready for submission.
    Completed,
    /// Input does not fit the current state; drop it silently.
    Ignored,
}

/// Read-only inputs the flow needs beyond the session itself.
pub struct FlowContext<'a> {
    pub media: &'a MediaConfig,
    pub job_types: &'a [String],
}

/// One user's in-progress questionnaire.
#[derive(Debug)]
pub struct Session {
    state: FormState,
    answers: Vec<(String, String)>,
    /// Job-prompt message to delete once a job is chosen.
    pub intro_msg_id: Option<i32>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: FormState::ChooseJob,
            answers: Vec::new(),
            intro_msg_id: None,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn answers(&self) -> &[(String, String)] {
        &self.answers
    }

    fn record(&mut self, label: &str, value: String) {
        match self.answers.iter_mut().find(|(k, _)| k == label) {
            Some((_, v)) => *v = value,
            None => self.answers.push((label.to_string(), value)),
        }
    }

    /// Feed one event through the flow table.
    pub fn apply(&mut self, event: &FormEvent, ctx: &FlowContext) -> StepOutcome {
        let Some(spec) = spec_for(self.state) else {
            return StepOutcome::Ignored;
        };
        let value = match accept(spec.expects, event, ctx) {
            Accepted::Value(v) => v,
            Accepted::Reject(msg) => return StepOutcome::Reprompt(msg),
            Accepted::Ignore => return StepOutcome::Ignored,
        };
        self.record(spec.label, value);
        let delete = if spec.state == FormState::ChooseJob {
            self.intro_msg_id.take()
        } else {
            None
        };
        self.state = spec.next;
        if self.state == FormState::Done {
            return StepOutcome::Completed;
        }
        StepOutcome::Advance { delete, prompts: entry_prompts(self.state, ctx) }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

enum Accepted {
    Value(String),
    Reject(String),
    Ignore,
}

fn accept(expects: Expect, event: &FormEvent, ctx: &FlowContext) -> Accepted {
    match (expects, event) {
        (Expect::Text, FormEvent::Text(t)) if !t.trim().is_empty() => {
            Accepted::Value(t.trim().to_string())
        }
        (Expect::Date, FormEvent::Text(t)) => {
            if is_valid_date(t) {
                Accepted::Value(t.trim().to_string())
            } else {
                Accepted::Reject(BIRTHDAY_REPROMPT.to_string())
            }
        }
        (Expect::TextOrContact, FormEvent::Text(t)) if !t.trim().is_empty() => {
            Accepted::Value(t.trim().to_string())
        }
        (Expect::TextOrContact, FormEvent::Contact(number)) => Accepted::Value(number.clone()),
        (Expect::Choice { prefix, options }, FormEvent::Selection { prefix: p, value })
            if p == prefix && options.contains(&value.as_str()) =>
        {
            Accepted::Value(value.clone())
        }
        (Expect::JobChoice, FormEvent::Selection { prefix, value })
            if prefix == "job" && ctx.job_types.iter().any(|job| job == value) =>
        {
            Accepted::Value(value.clone())
        }
        (Expect::Voice, FormEvent::Voice(file_id)) => Accepted::Value(file_id.clone()),
        (Expect::Video, FormEvent::Video(file_id)) => Accepted::Value(file_id.clone()),
        _ => Accepted::Ignore,
    }
}

fn static_options(options: &[&str]) -> Vec<String> {
    options.iter().map(|s| s.to_string()).collect()
}

/// Prompts sent when a state becomes current.
pub fn entry_prompts(state: FormState, ctx: &FlowContext) -> Vec<Prompt> {
    let prompt = match state {
        FormState::ChooseJob => Prompt::Choices {
            text: "Quyidagi tugmalardan birini tanlang (ish turi):".into(),
            prefix: "job",
            options: ctx.job_types.to_vec(),
        },
        FormState::AskName => Prompt::Text("Ism-familyangizni yozing:".into()),
        FormState::AskPhone => Prompt::ContactRequest(
            "Telefon raqamingizni yozing:\nMisol: +998909998877".into(),
        ),
        FormState::AskAddress => Prompt::TextRemoveKeyboard(
            "Doimiy yashash manzilingizni yozing (propiska):".into(),
        ),
        FormState::AskBirthday => {
            Prompt::Text("O'z tug'ilgan kuningizni 01.01.2000 formatda yozing:".into())
        }
        FormState::AskEducation => Prompt::Choices {
            text: "Ma'lumotingiz:".into(),
            prefix: "edu",
            options: static_options(EDUCATION_OPTIONS),
        },
        FormState::AskExperience => Prompt::Text(
            "Oldin qaysi korxonalarda va qaysi lavozimda ishlagansiz?\nMisol:\n1. Perfect Consulting Group - Sotuv menejeri\n2. Alora - sotuvchi\n3. Ishlamaganman".into(),
        ),
        FormState::AskMarital => Prompt::Choices {
            text: "Oila qurganmisiz?".into(),
            prefix: "marital",
            options: static_options(MARITAL_OPTIONS),
        },
        FormState::WaitVoiceAnswer => Prompt::VoicePrompt {
            file_id: ctx.media.voice_prompt_file_id.clone(),
            fallback: VOICE_FALLBACK.into(),
        },
        FormState::AskRussian => Prompt::Choices {
            text: "Rus tilini qay darajada bilasiz:".into(),
            prefix: "ru",
            options: static_options(RUSSIAN_OPTIONS),
        },
        FormState::WaitVideoAnswer => Prompt::VideoPrompt {
            file_id: ctx.media.russian_video_prompt_file_id.clone(),
            fallback: VIDEO_FALLBACK.into(),
        },
        FormState::AskConsent => Prompt::Choices {
            text: "Oxirgi ish joyingizdan siz haqingizda surishtirishimizga rozimisiz?".into(),
            prefix: "yn",
            options: static_options(YESNO_OPTIONS),
        },
        FormState::AskReference => Prompt::Text(
            "Oxirgi ish joyingizdan kim sizga tavsiya xati bera oladi, nomi, ishlash joyi, lavozimi, telefon raqami:\nMisol: Direktor - Malika Akramovna - Nona collection - +998909998877".into(),
        ),
        FormState::AskDuration => {
            Prompt::Text("Bizning korxonada qancha muddat ishlamoqchisiz?".into())
        }
        FormState::AskOvertime => Prompt::Text(
            "Korxonada ishdan keyin xam qolib ishlash kerak bo‘lib qolsa ishlaysizmi?".into(),
        ),
        FormState::AskHealth => Prompt::Text("Sog‘ligingizda muammo yo‘qmi?".into()),
        FormState::AskWhyLate => {
            Prompt::Text("Nima uchun ayrim odamlar ishga kech kelishadi?".into())
        }
        FormState::AskWhySteal => {
            Prompt::Text("Nima uchun ayrim insonlar o'g'rilik qilishadi?".into())
        }
        FormState::AskWhyGoodBad => Prompt::Text(
            "Nima uchun ayrim ishchilar yaxshi ishlashadi, ayrimlari yomon? Bunga sabab nima?".into(),
        ),
        FormState::AskPrevSalary => {
            Prompt::Text("Oldingi ishxonangizda qancha maoshga ishlgansiz?".into())
        }
        FormState::AskDesiredSalary => {
            Prompt::Text("Bizning ishxonamizda qancha maoshga ishlamoqchisiz?".into())
        }
        FormState::AskCourses => Prompt::Text("Qanday kurslarda o’qigansiz?".into()),
        FormState::Done => return Vec::new(),
    };
    vec![prompt]
}
