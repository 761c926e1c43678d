//! Command-line interface parsing and handling
//!
//! This module parses arguments, resolves settings and dispatches to the
//! interactive chat screen or one of the maintenance subcommands.

pub mod history;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::core::config::{Config, Settings};
use crate::core::history::HistoryStore;
use crate::core::request::{HttpTransport, RequestController};
use crate::core::session::ChatSessionController;
use crate::core::storage::{FileStore, KeyValueStore};
use crate::ui::appearance::detect_preferred_mode;
use crate::ui::chat_loop::run_chat;
use crate::ui::overlays::Overlay;
use crate::ui::renderer::UiState;
use crate::ui::theme::{initial_mode, Theme};
use crate::ui::typing::TypingIndicator;
use crate::utils::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "A terminal chat client for streaming chat endpoints")]
#[command(
    long_about = "Parley is a full-screen terminal chat client. Each message is posted to a \
chat endpoint and the reply is rendered as it streams in. Conversations are saved \
locally and restored on the next start.\n\n\
Environment Variables:\n\
  PARLEY_API_URL            Chat endpoint (default http://localhost:8001/api/stream)\n\
  PARLEY_STORAGE_KEY        Key the history is stored under\n\
  PARLEY_MAX_HISTORY_ITEMS  Number of messages kept\n\
  PARLEY_REQUEST_TIMEOUT    Request timeout in milliseconds\n\
  PARLEY_TYPING_DELAY       Typing cursor blink interval in milliseconds\n\
  PARLEY_LOG                Log filter directives used with --log\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a newline\n\
  PageUp/PageDown   Scroll the transcript\n\
  Ctrl+L            Clear the saved history\n\
  F2 / Ctrl+T       Switch between dark and light themes\n\
  F1                Show help\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Chat endpoint to use, overriding config and environment
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Write diagnostic logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Print the saved conversation
    History,
    /// Delete the saved conversation
    Clear,
    /// Show the resolved configuration
    Config,
}

/// Layers file, environment and command-line settings.
pub fn load_settings(args: &Args) -> Result<Settings, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let mut settings = config.resolve();
    if let Some(url) = &args.api_url {
        settings.api_url = url.clone();
    }
    Ok(settings)
}

fn open_store(settings: &Settings) -> Result<Arc<FileStore>, Box<dyn Error>> {
    let dir = settings
        .resolved_data_dir()
        .ok_or("no data directory available; set data_dir in the config file")?;
    Ok(Arc::new(FileStore::new(dir)))
}

fn history_store(store: Arc<dyn KeyValueStore>, settings: &Settings) -> HistoryStore {
    HistoryStore::new(
        store,
        settings.storage_key.clone(),
        settings.max_history_items,
    )
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => start_chat(settings).await,
        Commands::History => {
            let store = open_store(&settings)?;
            history::print_history(&history_store(store, &settings))?;
            Ok(())
        }
        Commands::Clear => {
            let store = open_store(&settings)?;
            history::clear_history(&history_store(store, &settings));
            Ok(())
        }
        Commands::Config => {
            settings.print_all();
            Ok(())
        }
    }
}

async fn start_chat(settings: Settings) -> Result<(), Box<dyn Error>> {
    let store: Arc<dyn KeyValueStore> = open_store(&settings)?;
    let history = history_store(store.clone(), &settings);
    let requests = RequestController::new(
        Arc::new(HttpTransport::default()),
        settings.api_url.clone(),
    );

    let mut controller = ChatSessionController::new(history, requests, settings.request_timeout);
    controller.restore_history();

    let mode = initial_mode(
        store.as_ref(),
        settings.theme.as_deref(),
        detect_preferred_mode(),
    );
    info!(theme = %mode, endpoint = %settings.api_url, "launching chat");

    let ui_state = UiState {
        theme: Theme::for_mode(mode),
        overlay: Overlay::None,
        typing: TypingIndicator::new(settings.typing_delay),
    };
    run_chat(controller, ui_state, store).await
}
