//! flowchat: terminal chat front-end for a Langflow-style flow API.
//!
//! Logging: set `RUST_LOG` (e.g. `flowchat_core=debug`) to override the
//! default filter. The interactive UI logs to `$CONFIG_DIR/flowchat/flowchat.log`
//! because it owns the terminal; `--message` mode logs to stderr.

mod app;
mod handler;
mod tui;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use flowchat_core::{ChatRole, ChatSession, Config, FlowClient, Settings, Transcript, Tweaks};
use tracing_subscriber::EnvFilter;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "flowchat", version)]
#[command(about = "Chat with a remote Langflow flow from the terminal")]
struct Cli {
    /// Flow id to run instead of the configured default
    #[arg(short, long)]
    flow: Option<String>,

    /// JSON file with per-node tweaks, replacing the configured ones
    #[arg(short, long)]
    tweaks: Option<PathBuf>,

    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    message: Option<String>,

    /// With --message, print the reply turn as JSON
    #[arg(long, requires = "message")]
    json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            std::process::exit(2);
        }
    };
    tracing::info!(?settings, "Configuration loaded");

    match cli.message.as_deref() {
        Some(message) => run_once(settings, message, cli.json).await,
        None => run_interactive(settings).await,
    }
}

fn init_logging(cli: &Cli) {
    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "flowchat=debug,flowchat_core=debug"
        } else {
            "flowchat=info,flowchat_core=info"
        })
    });

    if cli.message.is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    }

    let log_file = Config::get_config_dir()
        .map_err(|e| e.to_string())
        .and_then(|dir| open_log_file(&dir).map_err(|e| e.to_string()));
    match log_file {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        // Stderr belongs to the TUI once it starts, so warn once up front
        Err(e) => eprintln!("Warning: logging disabled, could not open log file: {e}"),
    }
}

fn open_log_file(dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(dir)?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("flowchat.log"))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = Config::load()?.resolve()?;
    apply_overrides(settings, cli)
}

/// Apply `--flow` and `--tweaks`. A blank `--flow` counts as unset.
fn apply_overrides(mut settings: Settings, cli: &Cli) -> Result<Settings> {
    if let Some(flow) = cli.flow.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        settings.flow_id = flow.to_string();
    }
    if let Some(path) = &cli.tweaks {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tweaks file {}", path.display()))?;
        let tweaks: Tweaks = serde_json::from_str(&content)
            .with_context(|| format!("Tweaks file {} is not a JSON object", path.display()))?;
        settings.tweaks = tweaks;
    }

    Ok(settings)
}

async fn run_once(settings: Settings, message: &str, json: bool) -> Result<()> {
    let mut session = ChatSession::start(settings);
    let turn = session
        .submit(message)
        .await
        .cloned()
        .context("Message is empty")?;
    session.end();

    if json {
        println!("{}", serde_json::to_string(&turn)?);
    }
    match turn.role() {
        ChatRole::Error => {
            if !json {
                eprintln!("Error: {}", turn.text());
            }
            std::process::exit(1);
        }
        _ => {
            if !json {
                println!("{}", turn.text());
            }
            Ok(())
        }
    }
}

async fn run_interactive(settings: Settings) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(FlowClient::new(settings));
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    let transcript = app.end_session();
    print_summary(&transcript);
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }
    Ok(())
}

fn print_summary(transcript: &Transcript) {
    let errors = transcript
        .all()
        .iter()
        .filter(|turn| turn.role() == ChatRole::Error)
        .count();
    if !transcript.is_empty() {
        eprintln!(
            "Session ended: {} turns ({} errors)",
            transcript.len(),
            errors
        );
    }
}
