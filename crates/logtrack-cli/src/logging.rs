use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Process-wide logging: console plus an optional append-only log file.
///
/// Installed as the default subscriber for as long as the value lives.
pub struct LogContext {
    _guard: DefaultGuard,
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

impl LogContext {
    pub fn init(level: &str, log_file: Option<&Path>) -> Result<Self> {
        let file_layer = match log_file {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    fs::create_dir_all(dir)
                        .with_context(|| format!("creating log directory {}", dir.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                Some(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
            }
            None => None,
        };

        let subscriber = tracing_subscriber::registry()
            .with(filter(level))
            .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
            .with(file_layer);
        Ok(Self {
            _guard: tracing::subscriber::set_default(subscriber),
        })
    }

    /// Console-only fallback when the log file cannot be opened.
    pub fn console_only(level: &str) -> Self {
        let subscriber = tracing_subscriber::registry()
            .with(filter(level))
            .with(fmt::layer().with_writer(std::io::stdout).with_target(false));
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}
