use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status token written into a tracker results column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Last marker line carried `Execution Return Code: 0`.
    Success,
    /// Last marker line carried `*** Failure`.
    Failure,
    /// Last marker line carried `*** Error:`.
    Error,
    /// No marker anywhere in the file.
    Unknown,
    /// The file vanished between listing and reading.
    NotFound,
    /// The file could not be read.
    ParseError,
    /// Placeholder before the merge post-pass.
    NotAnalyzed,
    /// The row's remote path could not be listed or copied.
    AccessError,
    /// The row has no remote path.
    MissingPath,
    /// The row has a path but no downloaded log matched it.
    LogNotFoundOrAnalyzed,
}

impl AnalysisStatus {
    pub const ALL: [AnalysisStatus; 10] = [
        AnalysisStatus::Success,
        AnalysisStatus::Failure,
        AnalysisStatus::Error,
        AnalysisStatus::Unknown,
        AnalysisStatus::NotFound,
        AnalysisStatus::ParseError,
        AnalysisStatus::NotAnalyzed,
        AnalysisStatus::AccessError,
        AnalysisStatus::MissingPath,
        AnalysisStatus::LogNotFoundOrAnalyzed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Success => "success",
            AnalysisStatus::Failure => "failure",
            AnalysisStatus::Error => "error",
            AnalysisStatus::Unknown => "unknown",
            AnalysisStatus::NotFound => "not_found",
            AnalysisStatus::ParseError => "parse_error",
            AnalysisStatus::NotAnalyzed => "not_analyzed",
            AnalysisStatus::AccessError => "access_error",
            AnalysisStatus::MissingPath => "missing_path",
            AnalysisStatus::LogNotFoundOrAnalyzed => "log_not_found_or_analyzed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown analysis status '{s}'"))
    }
}
