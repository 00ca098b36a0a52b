//! Local directory tree standing in for the remote filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use logtrack_core::error::{SessionError, TransferError};
use logtrack_core::fetch::{RemoteConnector, RemoteSession};

/// Maps remote path `/a/b/c` to `<root>/a/b/c`.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    root: PathBuf,
}

impl LocalMirror {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn resolve(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }
}

fn transfer_error(path: &str, source: std::io::Error) -> TransferError {
    if source.kind() == ErrorKind::NotFound {
        TransferError::NotFound {
            path: path.to_string(),
        }
    } else {
        TransferError::Io {
            path: path.to_string(),
            source,
        }
    }
}

impl RemoteConnector for LocalMirror {
    type Session = LocalMirrorSession;

    fn describe(&self) -> String {
        format!("local mirror {}", self.root.display())
    }

    fn connect(&self) -> Result<LocalMirrorSession, SessionError> {
        if !self.root.is_dir() {
            return Err(SessionError::Connect {
                host: self.root.display().to_string(),
                port: 0,
                source: std::io::Error::from(ErrorKind::NotFound),
            });
        }
        Ok(LocalMirrorSession {
            mirror: self.clone(),
        })
    }
}

pub struct LocalMirrorSession {
    mirror: LocalMirror,
}

impl RemoteSession for LocalMirrorSession {
    fn list_dir(&mut self, remote_dir: &str) -> Result<Vec<String>, TransferError> {
        let dir = self.mirror.resolve(remote_dir);
        debug!("Listing {}", dir.display());
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| transfer_error(remote_dir, e))? {
            let entry = entry.map_err(|e| transfer_error(remote_dir, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn download(&mut self, remote_file: &str, local_path: &Path) -> Result<u64, TransferError> {
        fs::copy(self.mirror.resolve(remote_file), local_path)
            .map_err(|e| transfer_error(remote_file, e))
    }
}
