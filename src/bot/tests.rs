//! End-to-end tests for the questionnaire flow, driven purely through the
//! state machine and the in-memory store.

use crate::bot::flow::{
    FlowContext, FormEvent, FormState, Prompt, Session, StepOutcome, FLOW,
};
use crate::bot::submit::build_report;
use crate::store::{MediaConfig, MemoryStore, RecordStore, Storage};

fn job_types() -> Vec<String> {
    vec!["Sotuvchi".to_string(), "Omborchi".to_string()]
}

fn ctx<'a>(media: &'a MediaConfig, jobs: &'a [String]) -> FlowContext<'a> {
    FlowContext { media, job_types: jobs }
}

fn text(s: &str) -> FormEvent {
    FormEvent::Text(s.to_string())
}

fn select(prefix: &str, value: &str) -> FormEvent {
    FormEvent::Selection { prefix: prefix.to_string(), value: value.to_string() }
}

/// The 22 inputs of a complete application, in flow order.
fn full_walk() -> Vec<FormEvent> {
    vec![
        select("job", "Sotuvchi"),
        text("Ali Valiyev"),
        FormEvent::Contact("+998901234567".to_string()),
        text("Tashkent"),
        text("15.06.1995"),
        select("edu", "oliy"),
        text("1. Alora - sotuvchi"),
        select("marital", "turmush qurganman"),
        FormEvent::Voice("voice-file-id".to_string()),
        select("ru", "yaxshi"),
        FormEvent::Video("video-file-id".to_string()),
        select("yn", "ha"),
        text("Direktor - Malika Akramovna"),
        text("5 yil"),
        text("ha"),
        text("yo'q"),
        text("uyqu"),
        text("pul"),
        text("motivatsiya"),
        text("3 mln"),
        text("5 mln"),
        text("IT kurslari"),
    ]
}

#[test]
fn test_flow_table_is_linear_and_complete() {
    assert_eq!(FLOW.len(), 22);
    // Each state's successor is the next table entry; the last step finishes.
    for pair in FLOW.windows(2) {
        assert_eq!(pair[0].next, pair[1].state);
    }
    assert_eq!(FLOW.last().unwrap().next, FormState::Done);
    // Answer labels are unique
    for (i, a) in FLOW.iter().enumerate() {
        for b in &FLOW[i + 1..] {
            assert_ne!(a.label, b.label);
        }
    }
}

#[test]
fn test_full_walk_completes_with_all_answers() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    let inputs = full_walk();
    let last = inputs.len() - 1;
    for (i, event) in inputs.iter().enumerate() {
        let outcome = session.apply(event, &ctx);
        if i == last {
            assert_eq!(outcome, StepOutcome::Completed);
        } else {
            assert!(
                matches!(outcome, StepOutcome::Advance { .. }),
                "step {i} did not advance: {outcome:?}"
            );
        }
    }

    let answers = session.answers();
    assert_eq!(answers.len(), 22);
    // Capture order matches flow order
    for (spec, (label, _)) in FLOW.iter().zip(answers) {
        assert_eq!(spec.label, label.as_str());
    }
    assert_eq!(answers[0], ("Ish turi".to_string(), "Sotuvchi".to_string()));
    assert_eq!(answers[1], ("Ism-familiya".to_string(), "Ali Valiyev".to_string()));
    assert_eq!(answers[2], ("Telefon raqami".to_string(), "+998901234567".to_string()));
}

#[test]
fn test_report_for_full_walk() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    for event in full_walk() {
        session.apply(&event, &ctx);
    }

    let report = build_report(555, session.answers());
    assert!(report.starts_with("📝 Yangi ariza #555"));
    assert!(report.contains("Ish turi: Sotuvchi"));
    assert!(report.contains("Ism-familiya: Ali Valiyev"));
    assert!(report.contains("Telefon raqami: +998901234567"));
    assert!(report.contains("Ovozli javob (file_id): voice-file-id"));
    assert!(report.contains("Video javob (file_id): video-file-id"));
}

#[test]
fn test_phone_accepts_plain_text_too() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    session.apply(&select("job", "Sotuvchi"), &ctx);
    session.apply(&text("Ali Valiyev"), &ctx);
    let outcome = session.apply(&text("+998909998877"), &ctx);
    assert!(matches!(outcome, StepOutcome::Advance { .. }));
    assert_eq!(session.state(), FormState::AskAddress);
}

#[test]
fn test_attachment_gated_states_ignore_other_input() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    for event in full_walk().into_iter().take(8) {
        session.apply(&event, &ctx);
    }
    assert_eq!(session.state(), FormState::WaitVoiceAnswer);
    let answers_before = session.answers().to_vec();

    // Text, video, and selections are all dropped while waiting for voice
    assert_eq!(session.apply(&text("not a voice"), &ctx), StepOutcome::Ignored);
    assert_eq!(session.apply(&FormEvent::Video("v".into()), &ctx), StepOutcome::Ignored);
    assert_eq!(session.apply(&select("yn", "ha"), &ctx), StepOutcome::Ignored);
    assert_eq!(session.state(), FormState::WaitVoiceAnswer);
    assert_eq!(session.answers(), answers_before.as_slice());
}

#[test]
fn test_selection_states_ignore_foreign_payloads() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    // Wrong prefix, unknown job, and free text are all ignored at ChooseJob
    assert_eq!(session.apply(&select("edu", "oliy"), &ctx), StepOutcome::Ignored);
    assert_eq!(session.apply(&select("job", "Direktor"), &ctx), StepOutcome::Ignored);
    assert_eq!(session.apply(&text("Sotuvchi"), &ctx), StepOutcome::Ignored);
    assert_eq!(session.state(), FormState::ChooseJob);
    assert!(session.answers().is_empty());
}

#[test]
fn test_birthday_reprompts_without_advancing() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    for event in full_walk().into_iter().take(4) {
        session.apply(&event, &ctx);
    }
    assert_eq!(session.state(), FormState::AskBirthday);

    for bad in ["31.02.2020", "00.01.2020", "1.1.2020"] {
        let outcome = session.apply(&text(bad), &ctx);
        assert!(matches!(outcome, StepOutcome::Reprompt(_)), "{bad} was not re-prompted");
        assert_eq!(session.state(), FormState::AskBirthday);
    }

    let outcome = session.apply(&text("15.06.1995"), &ctx);
    assert!(matches!(outcome, StepOutcome::Advance { .. }));
    assert_eq!(session.state(), FormState::AskEducation);
}

#[test]
fn test_job_choice_deletes_intro_prompt() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    session.intro_msg_id = Some(42);
    let outcome = session.apply(&select("job", "Sotuvchi"), &ctx);
    match outcome {
        StepOutcome::Advance { delete, .. } => assert_eq!(delete, Some(42)),
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Consumed: a later (impossible) revisit would not delete again
    assert_eq!(session.intro_msg_id, None);
}

#[test]
fn test_voice_prompt_uses_registered_media() {
    let media = MediaConfig {
        voice_prompt_file_id: Some("stored-voice".to_string()),
        ..Default::default()
    };
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    let mut outcome = StepOutcome::Ignored;
    for event in full_walk().into_iter().take(8) {
        outcome = session.apply(&event, &ctx);
    }
    match outcome {
        StepOutcome::Advance { prompts, .. } => {
            assert_eq!(
                prompts,
                vec![Prompt::VoicePrompt {
                    file_id: Some("stored-voice".to_string()),
                    fallback: "Iltimos, savolga OVOZ xabari bilan javob yuboring.".to_string(),
                }]
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_video_prompt_falls_back_to_text_when_unset() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    let mut outcome = StepOutcome::Ignored;
    for event in full_walk().into_iter().take(10) {
        outcome = session.apply(&event, &ctx);
    }
    assert_eq!(session.state(), FormState::WaitVideoAnswer);
    match outcome {
        StepOutcome::Advance { prompts, .. } => {
            assert_eq!(
                prompts,
                vec![Prompt::VideoPrompt {
                    file_id: None,
                    fallback: "Iltimos, VIDEOLI xabar yuboring (video yoki video-note).".to_string(),
                }]
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_video_note_satisfies_video_step() {
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    for event in full_walk().into_iter().take(10) {
        session.apply(&event, &ctx);
    }
    // A video-note arrives as FormEvent::Video with the note's file id
    let outcome = session.apply(&FormEvent::Video("note-id".to_string()), &ctx);
    assert!(matches!(outcome, StepOutcome::Advance { .. }));
    assert_eq!(session.state(), FormState::AskConsent);
}

#[test]
fn test_fresh_session_has_empty_answers() {
    // Restart and cancellation both drop the old session wholesale; a new
    // one starts from the first question with nothing captured.
    let media = MediaConfig::default();
    let jobs = job_types();
    let ctx = ctx(&media, &jobs);

    let mut session = Session::new();
    session.apply(&select("job", "Sotuvchi"), &ctx);
    session.apply(&text("Ali Valiyev"), &ctx);
    assert!(!session.answers().is_empty());

    let session = Session::new();
    assert_eq!(session.state(), FormState::ChooseJob);
    assert!(session.answers().is_empty());
}

#[test]
fn test_submission_snapshot_includes_self_healed_admins() {
    let backend = MemoryStore::default();
    backend.store("admins", r#"{"admins":[42,43]}"#).unwrap();
    let storage = Storage::new(Box::new(backend), 7);
    let admins = storage.admins();
    assert_eq!(admins, vec![42, 43, 7]);
}
