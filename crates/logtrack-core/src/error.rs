use std::path::PathBuf;

use thiserror::Error;

/// Failures loading or saving the tracker table.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tracker file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read tracker {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse tracker {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("tracker {path} is missing the required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("permission denied writing tracker {path} (is it open in another program?)")]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write tracker {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classifies a write failure, keeping permission problems distinct.
    pub fn from_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            StoreError::PermissionDenied { path, source }
        } else {
            StoreError::WriteFile { path, source }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("row {row} has {actual} values but the tracker has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Errors that make the local download directory unusable for classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("local log directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to list local log directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures establishing the remote session. Always fatal to the run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("authentication failed for {user}@{host}")]
    Authentication { host: String, user: String },

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    #[error("connection to {host}:{port} timed out after {seconds}s")]
    Timeout {
        host: String,
        port: u16,
        seconds: u64,
    },

    #[error("protocol negotiation with {host} failed: {message}")]
    Protocol { host: String, message: String },
}

/// Per-row failure while listing or copying. Recorded, never fatal.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("remote path not found: {path}")]
    NotFound { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("remote error on {path}: {message}")]
    Other { path: String, message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("invalid config file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },
}

/// Run-level failure of an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tracker error: {0}")]
    Store(#[from] StoreError),

    #[error("remote session error: {0}")]
    Session(#[from] SessionError),

    #[error("log analysis failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error("failed to create download directory {path}: {source}")]
    DownloadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AnalyzeError {
    /// Process exit code the orchestrating caller branches on.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalyzeError::Config(_) => 1,
            AnalyzeError::Store(StoreError::PermissionDenied { .. }) => 3,
            AnalyzeError::Store(StoreError::WriteFile { .. }) => 5,
            AnalyzeError::Store(_) => 1,
            AnalyzeError::Session(_) => 2,
            AnalyzeError::Classify(_) => 4,
            AnalyzeError::DownloadDir { .. } | AnalyzeError::Unexpected(_) => 5,
        }
    }
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_from_write_keeps_permission_denied_distinct() {
        let denied = StoreError::from_write("t.csv", Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(denied, StoreError::PermissionDenied { .. }));

        let other = StoreError::from_write("t.csv", Error::from(ErrorKind::Other));
        assert!(matches!(other, StoreError::WriteFile { .. }));
    }

    #[test]
    fn test_exit_codes_follow_failure_category() {
        let missing = AnalyzeError::from(ConfigError::MissingCredentials(vec![
            "SSH_HOSTNAME".to_string(),
        ]));
        assert_eq!(missing.exit_code(), 1);

        let tracker = AnalyzeError::from(StoreError::NotFound {
            path: PathBuf::from("t.csv"),
        });
        assert_eq!(tracker.exit_code(), 1);

        let session = AnalyzeError::from(SessionError::Authentication {
            host: "h".to_string(),
            user: "u".to_string(),
        });
        assert_eq!(session.exit_code(), 2);

        let denied = AnalyzeError::from(StoreError::from_write(
            "t.csv",
            Error::from(ErrorKind::PermissionDenied),
        ));
        assert_eq!(denied.exit_code(), 3);

        let classify = AnalyzeError::from(ClassifyError::DirectoryNotFound {
            path: PathBuf::from("gone"),
        });
        assert_eq!(classify.exit_code(), 4);

        let write = AnalyzeError::from(StoreError::from_write("t.csv", Error::from(ErrorKind::Other)));
        assert_eq!(write.exit_code(), 5);

        let unexpected = AnalyzeError::from(anyhow::anyhow!("boom"));
        assert_eq!(unexpected.exit_code(), 5);
    }

    #[test]
    fn test_missing_credentials_message_lists_every_variable() {
        let err = ConfigError::MissingCredentials(vec![
            "SSH_USERNAME".to_string(),
            "SSH_PASSWORD".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing required environment variables: SSH_USERNAME, SSH_PASSWORD"
        );
    }
}
