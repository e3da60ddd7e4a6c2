//! Structured logging setup
//!
//! Plain text to stderr by default, or JSON lines to `logging.file`. The
//! `VIKEY_LOG` environment variable overrides the configured filter.
//! Key codes and typed text are never logged; only counts, modes and
//! encodings are.

use crate::config::LoggingConfig;
use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

pub const LOG_ENV: &str = "VIKEY_LOG";
const FALLBACK_LEVEL: &str = "info";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber; later calls are no-ops
pub fn init(config: &LoggingConfig) {
    init_once(config, &TRACING_INIT);
}

fn init_once(config: &LoggingConfig, once: &OnceLock<()>) {
    let _ = once.get_or_init(|| {
        let env_value = env::var(LOG_ENV).ok();
        let filter = EnvFilter::try_new(directive(env_value.as_deref(), &config.level))
            .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL));

        let file_error = match config.file.as_deref().map(open_append) {
            Some(Ok(file)) => {
                let subscriber = tracing_subscriber::fmt()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .with_current_span(false)
                    .with_span_list(false)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
                return;
            }
            Some(Err(e)) => Some(e),
            None => None,
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
        if let Some(e) = file_error {
            tracing::warn!(error = %e, "cannot open log file, logging to stderr");
        }
    });
}

/// A non-empty environment value wins over the configured level
fn directive<'a>(env_value: Option<&'a str>, configured: &'a str) -> &'a str {
    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => configured,
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
