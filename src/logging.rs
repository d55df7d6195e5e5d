//! File logging for the TUI.
//!
//! The terminal belongs to ratatui while the app runs, so everything goes to a
//! daily rolling JSON log under the user's data directory.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "booking-chat.log";
const DEFAULT_FILTER: &str = "booking_chat=info,booking_core=info,warn";
const VERBOSE_FILTER: &str = "booking_chat=debug,booking_core=debug,warn";

pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("booking-chat").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the file subscriber.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_tui(verbose: bool) -> WorkerGuard {
    let log_dir = log_dir();

    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_target(true)
        .with_filter(env_filter(verbose));

    tracing_subscriber::registry().with(file_layer).init();

    tracing::info!(
        log_file = %log_dir.join(LOG_FILE).display(),
        "logging initialized"
    );

    guard
}
