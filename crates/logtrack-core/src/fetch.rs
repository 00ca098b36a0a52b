//! Remote log fetching.
//!
//! Filenames are assumed to embed a sortable timestamp, so the entry that
//! sorts greatest as a string is the newest log. This is a property of the
//! naming scheme and is not checked.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{SessionError, TransferError};
use crate::tracker::Tracker;

/// An open remote session. Implementations release their resources on drop.
pub trait RemoteSession {
    /// Entry names (not full paths) in a remote directory.
    fn list_dir(&mut self, remote_dir: &str) -> Result<Vec<String>, TransferError>;

    /// Copies a remote file to `local_path`, returning the bytes written.
    fn download(&mut self, remote_file: &str, local_path: &Path) -> Result<u64, TransferError>;
}

/// Opens remote sessions.
pub trait RemoteConnector {
    type Session: RemoteSession;

    /// Human-readable target for log messages.
    fn describe(&self) -> String;

    fn connect(&self) -> Result<Self::Session, SessionError>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub downloaded: Vec<String>,
    pub skipped_duplicates: Vec<String>,
    pub problem_paths: IndexSet<String>,
}

/// Joins a remote directory and an entry name with a single separator.
pub fn remote_join(remote_dir: &str, name: &str) -> String {
    format!("{}/{}", remote_dir.trim_end_matches('/'), name)
}

/// Newest entry under the timestamped naming scheme.
pub fn select_latest(entries: &[String]) -> Option<&str> {
    entries.iter().max().map(String::as_str)
}

/// Downloads the newest log of every tracked remote directory into
/// `local_dir`, one session for the whole run.
///
/// Per-row failures are recorded in the report; only failing to open the
/// session is an error.
pub fn fetch_latest<C: RemoteConnector>(
    tracker: &Tracker,
    path_column: &str,
    connector: &C,
    local_dir: &Path,
) -> Result<FetchReport, SessionError> {
    info!("Opening remote session to {}", connector.describe());
    let mut session = connector.connect()?;
    info!("Remote session established");

    let mut report = FetchReport::default();
    let mut copied: HashSet<String> = HashSet::new();

    for row in 0..tracker.len() {
        let Some(remote_dir) = tracker.remote_path(row, path_column) else {
            warn!("Skipping row {}: missing remote path", row);
            continue;
        };

        info!("Processing remote path {}", remote_dir);
        match fetch_one(&mut session, remote_dir, local_dir, &copied) {
            Ok(FetchOutcome::Downloaded(name)) => {
                copied.insert(name.clone());
                report.downloaded.push(name);
            }
            Ok(FetchOutcome::Duplicate(name)) => {
                info!("Skipping duplicate download of {}", name);
                report.skipped_duplicates.push(name);
            }
            Ok(FetchOutcome::Empty) => {
                warn!("No log files found in {}", remote_dir);
                report.problem_paths.insert(remote_dir.to_string());
            }
            Err(err) => {
                error!("Failed to fetch from {}: {}", remote_dir, err);
                report.problem_paths.insert(remote_dir.to_string());
            }
        }
    }

    drop(session);
    info!(
        "Log download finished: {} downloaded, {} duplicates skipped",
        report.downloaded.len(),
        report.skipped_duplicates.len()
    );
    if !report.problem_paths.is_empty() {
        let mut sorted: Vec<&String> = report.problem_paths.iter().collect();
        sorted.sort();
        warn!(
            "Could not access or process {} remote paths: {:?}",
            sorted.len(),
            sorted
        );
    }
    Ok(report)
}

enum FetchOutcome {
    Downloaded(String),
    Duplicate(String),
    Empty,
}

fn fetch_one<S: RemoteSession>(
    session: &mut S,
    remote_dir: &str,
    local_dir: &Path,
    copied: &HashSet<String>,
) -> Result<FetchOutcome, TransferError> {
    let entries = session.list_dir(remote_dir)?;
    let Some(latest) = select_latest(&entries) else {
        return Ok(FetchOutcome::Empty);
    };
    info!("Latest log file in {}: {}", remote_dir, latest);

    if copied.contains(latest) {
        return Ok(FetchOutcome::Duplicate(latest.to_string()));
    }

    let remote_file = remote_join(remote_dir, latest);
    let local_path: PathBuf = local_dir.join(latest);
    info!(
        "Downloading '{}' -> '{}'",
        remote_file,
        local_path.display()
    );
    let bytes = session
        .download(&remote_file, &local_path)
        .inspect_err(|_| discard_partial(&local_path))?;
    info!("Downloaded {} bytes", bytes);
    Ok(FetchOutcome::Downloaded(latest.to_string()))
}

/// A failed copy must not leave a truncated log behind for the classifier.
fn discard_partial(local_path: &Path) {
    match fs::remove_file(local_path) {
        Ok(()) => warn!("Removed partial download {}", local_path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => error!(
            "Failed to remove partial download {}: {}",
            local_path.display(),
            err
        ),
    }
}
