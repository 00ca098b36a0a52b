//! Log classification.
//!
//! A log's outcome is decided by the line closest to the end of the file that
//! contains one of the known markers. Markers are checked in a fixed priority
//! order, so a line carrying more than one marker resolves to the first.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::ClassifyError;
use crate::types::AnalysisStatus;

pub const SUCCESS_MARKER: &str = "Execution Return Code: 0";
pub const FAILURE_MARKER: &str = "*** Failure";
pub const ERROR_MARKER: &str = "*** Error:";

/// Ordered marker table; earlier entries win when a line matches several.
pub const MARKERS: [(&str, AnalysisStatus); 3] = [
    (SUCCESS_MARKER, AnalysisStatus::Success),
    (FAILURE_MARKER, AnalysisStatus::Failure),
    (ERROR_MARKER, AnalysisStatus::Error),
];

/// Filename -> status. Iterates in filename order.
pub type Classification = BTreeMap<String, AnalysisStatus>;

/// Returns the status for a single line, if it carries a marker.
pub fn classify_line(line: &str) -> Option<AnalysisStatus> {
    MARKERS
        .iter()
        .find(|(marker, _)| line.contains(marker))
        .map(|(_, status)| *status)
}

/// Scans lines from the end and stops at the first marker line.
pub fn classify_lines<'a, I>(lines: I) -> (AnalysisStatus, Option<&'a str>)
where
    I: DoubleEndedIterator<Item = &'a str>,
{
    for line in lines.rev() {
        if let Some(status) = classify_line(line) {
            return (status, Some(line));
        }
    }
    (AnalysisStatus::Unknown, None)
}

/// Splits on `\n`, `\r\n` and lone `\r`, dropping empty pieces.
pub fn log_lines(text: &str) -> impl DoubleEndedIterator<Item = &str> {
    text.split(['\n', '\r']).filter(|line| !line.is_empty())
}

/// Classifies in-memory log text.
pub fn classify_text(text: &str) -> AnalysisStatus {
    classify_lines(log_lines(text)).0
}

/// Reads and classifies one local file. Undecodable bytes are replaced.
pub fn classify_file(path: &Path) -> AnalysisStatus {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            error!("Log file vanished during analysis: {}", path.display());
            return AnalysisStatus::NotFound;
        }
        Err(err) => {
            error!("Error reading log file {}: {}", path.display(), err);
            return AnalysisStatus::ParseError;
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    let (status, line) = classify_lines(log_lines(&text));
    match (status, line) {
        (AnalysisStatus::Failure | AnalysisStatus::Error, Some(line)) => {
            warn!(
                "Found {} marker in {}: {}",
                status,
                path.display(),
                line.trim()
            );
        }
        (AnalysisStatus::Unknown, _) => {
            info!(
                "No markers found in {}, status set to 'unknown'",
                path.display()
            );
        }
        _ => {}
    }
    status
}

/// Classifies every file in `local_dir`.
///
/// A missing or unlistable directory is an error; an existing empty
/// directory yields an empty mapping.
pub fn classify_directory(local_dir: &Path) -> Result<Classification, ClassifyError> {
    info!("Starting analysis of logs in {}", local_dir.display());

    if !local_dir.is_dir() {
        error!("Local log directory not found: {}", local_dir.display());
        return Err(ClassifyError::DirectoryNotFound {
            path: local_dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(local_dir).map_err(|source| ClassifyError::ListDirectory {
        path: local_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ClassifyError::ListDirectory {
            path: local_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            debug!("Skipping directory entry {}", entry.path().display());
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }

    if files.is_empty() {
        warn!("No log files found in {}", local_dir.display());
        return Ok(Classification::new());
    }

    info!("Found {} log files to analyze", files.len());
    let mut results = Classification::new();
    for name in files {
        let status = classify_file(&local_dir.join(&name));
        info!("Analysis result for '{}': {}", name, status);
        results.insert(name, status);
    }

    info!("Log analysis finished");
    Ok(results)
}
