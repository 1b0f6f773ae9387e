mod bot;
mod config;
mod store;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::prelude::*;

use bot::flow::Session;
use bot::handlers;
use config::Config;
use store::{FileStore, Storage};

/// Shared bot state: immutable config, the record store, and one live
/// session per chat.
pub struct BotState {
    pub config: Config,
    pub storage: Storage,
    pub sessions: Mutex<HashMap<ChatId, Session>>,
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "anketabot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("anketabot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting anketabot...");
    info!("Loaded config from {config_path}");
    info!("Main admin: {}", config.main_admin);
    info!("Job types: {:?}", config.job_types);

    let bot = Bot::new(&config.telegram_bot_token);
    let storage = Storage::new(
        Box::new(FileStore::new(config.data_dir.clone())),
        config.main_admin,
    );
    let state = Arc::new(BotState {
        config,
        storage,
        sessions: Mutex::new(HashMap::new()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
