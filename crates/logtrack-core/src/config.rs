use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::tracker::{DEFAULT_PATH_COLUMN, DEFAULT_RESULTS_PREFIX};

pub const HOSTNAME_VAR: &str = "SSH_HOSTNAME";
pub const USERNAME_VAR: &str = "SSH_USERNAME";
pub const PASSWORD_VAR: &str = "SSH_PASSWORD";

/// Settings of an analysis run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Tracker CSV file
    pub tracker_path: PathBuf,

    /// Base directory for `<YYYYMMDD>_logs` download directories
    pub download_base: PathBuf,

    /// Application log file
    pub app_log_file: PathBuf,

    /// Column holding each row's remote directory
    pub path_column: String,

    /// Prefix of the dated results columns
    pub results_prefix: String,

    /// SFTP server port
    pub sftp_port: u16,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            tracker_path: env_or(
                "LOGTRACK_TRACKER",
                PathBuf::from("data/log_analysis_tracker.csv"),
            ),
            download_base: env_or("LOGTRACK_DOWNLOAD_DIR", PathBuf::from("data/downloaded_logs")),
            app_log_file: env_or("LOGTRACK_APP_LOG", PathBuf::from("logs/log_analyzer.log")),
            path_column: DEFAULT_PATH_COLUMN.to_string(),
            results_prefix: DEFAULT_RESULTS_PREFIX.to_string(),
            sftp_port: env_or("SSH_PORT", 2222),
            connect_timeout_secs: env_or("SSH_TIMEOUT_SECS", 15),
        }
    }
}

impl AnalyzerConfig {
    /// Loads a YAML config file; missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content).map_err(|message| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// SSH login for the SFTP server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves every variable through `lookup`, reporting all missing ones
    /// at once. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        info!("Loading SSH credentials from the environment");
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let hostname = read(HOSTNAME_VAR);
        let username = read(USERNAME_VAR);
        let password = read(PASSWORD_VAR);

        let missing: Vec<String> = [
            (HOSTNAME_VAR, hostname.is_none()),
            (USERNAME_VAR, username.is_none()),
            (PASSWORD_VAR, password.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name.to_string())
        .collect();

        match (hostname, username, password) {
            (Some(hostname), Some(username), Some(password)) => {
                info!("SSH credentials loaded for {}@{}", username, hostname);
                Ok(Self {
                    hostname,
                    username,
                    password,
                })
            }
            _ => Err(ConfigError::MissingCredentials(missing)),
        }
    }
}
