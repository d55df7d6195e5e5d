mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use booking_core::timezone::is_valid_timezone;
use booking_core::{ChatController, Config, HttpTransport, Transcript};

use app::App;
use tui::{EventHandler, Tui};

const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(
    name = "booking-chat",
    about = "Chat with the booking assistant from your terminal",
    version
)]
struct Cli {
    /// Path to config file (default: ~/.config/booking-chat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8000
    #[arg(long)]
    base_url: Option<String>,

    /// IANA timezone sent with each message (default: detected)
    #[arg(long)]
    timezone: Option<String>,

    /// Don't send the local time with each message
    #[arg(long)]
    no_client_time: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;

    if let Some(Commands::Config { action }) = cli.command {
        return handle_config_command(action, &config, &config_path);
    }

    // Apply CLI overrides
    if let Some(timezone) = cli.timezone {
        if !is_valid_timezone(&timezone) {
            bail!("Unknown timezone '{}', expected an IANA name like Europe/Berlin", timezone);
        }
        config.timezone = Some(timezone);
    }
    if cli.no_client_time {
        config.send_client_time = Some(false);
    }

    let _log_guard = logging::init_tui(cli.verbose);

    let settings = config.client_settings_with(cli.base_url.as_deref());
    let transport = HttpTransport::with_options(
        &settings.base_url,
        config.session_cookie().as_deref(),
        config.request_timeout(),
    )?;

    tracing::info!(
        base_url = %settings.base_url,
        timezone = %settings.timezone,
        send_client_time = settings.send_client_time,
        "starting booking chat"
    );

    let controller = ChatController::new(Arc::new(transport), Transcript::new(), settings);
    let mut app = App::new(controller);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    app.start_probe();

    while !app.should_quit {
        app.poll_tasks().await;
        app.follow_transcript();

        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }

    Ok(())
}

fn handle_config_command(action: ConfigAction, config: &Config, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
            println!();
            println!("Effective base URL: {}", config.base_url());
            println!("Effective timezone: {}", config.client_settings().timezone);
            println!("Logs: {}", logging::log_dir().display());
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            if path.exists() {
                bail!("Config file already exists at {}", path.display());
            }
            Config::new().save_to(path)?;
            println!("Wrote default config to {}", path.display());
        }
    }
    Ok(())
}
