//! JSON record persistence for prompt media and the admin registry.
//!
//! Two flat records, each rewritten wholesale on every change. Reads never
//! fail: a missing or corrupt record degrades to the built-in default so the
//! questionnaire flow keeps working.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

const MEDIA_RECORD: &str = "media";
const ADMINS_RECORD: &str = "admins";

/// Raw record backend. One JSON payload per named record.
pub trait RecordStore: Send + Sync {
    fn load(&self, record: &str) -> Option<String>;
    fn store(&self, record: &str, payload: &str) -> std::io::Result<()>;
}

/// File-backed store: `<dir>/<record>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        std::fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    fn path(&self, record: &str) -> PathBuf {
        self.dir.join(format!("{record}.json"))
    }
}

impl RecordStore for FileStore {
    fn load(&self, record: &str) -> Option<String> {
        std::fs::read_to_string(self.path(record)).ok()
    }

    fn store(&self, record: &str, payload: &str) -> std::io::Result<()> {
        std::fs::write(self.path(record), payload)
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl RecordStore for MemoryStore {
    fn load(&self, record: &str) -> Option<String> {
        self.records
            .lock()
            .expect("record lock poisoned")
            .get(record)
            .cloned()
    }

    fn store(&self, record: &str, payload: &str) -> std::io::Result<()> {
        self.records
            .lock()
            .expect("record lock poisoned")
            .insert(record.to_string(), payload.to_string());
        Ok(())
    }
}

/// Registered prompt media. Every field is optional; absence means the
/// corresponding step falls back to a text instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    pub intro_video_file_id: Option<String>,
    pub voice_prompt_file_id: Option<String>,
    pub russian_video_prompt_file_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct AdminRecord {
    admins: Vec<i64>,
}

/// Typed facade over the record backend.
pub struct Storage {
    backend: Box<dyn RecordStore>,
    main_admin: i64,
}

impl Storage {
    pub fn new(backend: Box<dyn RecordStore>, main_admin: i64) -> Self {
        Self { backend, main_admin }
    }

    fn read<T: DeserializeOwned>(&self, record: &str) -> Option<T> {
        let payload = self.backend.load(record)?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Corrupt '{record}' record, using defaults: {e}");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, record: &str, value: &T) {
        let payload = match serde_json::to_string_pretty(value) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialize '{record}' record: {e}");
                return;
            }
        };
        if let Err(e) = self.backend.store(record, &payload) {
            warn!("Failed to persist '{record}' record: {e}");
        }
    }

    pub fn media(&self) -> MediaConfig {
        self.read(MEDIA_RECORD).unwrap_or_default()
    }

    pub fn set_intro_video(&self, file_id: String) {
        let mut media = self.media();
        media.intro_video_file_id = Some(file_id);
        self.write(MEDIA_RECORD, &media);
    }

    pub fn set_voice_prompt(&self, file_id: String) {
        let mut media = self.media();
        media.voice_prompt_file_id = Some(file_id);
        self.write(MEDIA_RECORD, &media);
    }

    pub fn set_russian_video(&self, file_id: String) {
        let mut media = self.media();
        media.russian_video_prompt_file_id = Some(file_id);
        self.write(MEDIA_RECORD, &media);
    }

    /// Current admin set. The main admin is always present: a persisted
    /// record missing it is repaired and written back before returning.
    pub fn admins(&self) -> Vec<i64> {
        let mut record: AdminRecord = self
            .read(ADMINS_RECORD)
            .unwrap_or(AdminRecord { admins: vec![self.main_admin] });
        if !record.admins.contains(&self.main_admin) {
            record.admins.push(self.main_admin);
            self.write(ADMINS_RECORD, &record);
        }
        record.admins
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins().contains(&user_id)
    }

    pub fn is_main_admin(&self, user_id: i64) -> bool {
        user_id == self.main_admin
    }

    pub fn add_admin(&self, user_id: i64) {
        let mut admins = self.admins();
        if !admins.contains(&user_id) {
            admins.push(user_id);
            self.write(ADMINS_RECORD, &AdminRecord { admins });
        }
    }

    /// Removes an admin. Returns false (and changes nothing) for the main
    /// admin or an id that was never registered.
    pub fn remove_admin(&self, user_id: i64) -> bool {
        if user_id == self.main_admin {
            return false;
        }
        let mut admins = self.admins();
        let Some(pos) = admins.iter().position(|&id| id == user_id) else {
            return false;
        };
        admins.remove(pos);
        self.write(ADMINS_RECORD, &AdminRecord { admins });
        true
    }
}
