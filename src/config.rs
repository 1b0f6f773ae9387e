use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// The immutable main administrator (Telegram user id).
    main_admin: u64,
    /// Job types offered on the first question.
    #[serde(default = "default_job_types")]
    job_types: Vec<String>,
    /// Directory for state files (media/admin records, logs). Defaults to current directory.
    data_dir: Option<String>,
}

fn default_job_types() -> Vec<String> {
    ["Sotuvchi", "Sotuv menejeri", "Omborchi"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub struct Config {
    pub telegram_bot_token: String,
    /// Main administrator id. Always part of the admin registry, can never be removed.
    pub main_admin: i64,
    pub job_types: Vec<String>,
    /// Directory for state files (media/admin records, logs).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.main_admin == 0 {
            return Err(ConfigError::Validation("main_admin must be a non-zero user id".into()));
        }
        if file.job_types.is_empty() {
            return Err(ConfigError::Validation("job_types must contain at least one entry".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            main_admin: file.main_admin as i64,
            job_types: file.job_types,
            data_dir,
        })
    }
}
