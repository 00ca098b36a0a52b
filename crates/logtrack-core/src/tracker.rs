//! In-memory tracker table and the merge of classification results into it.

use std::collections::BTreeSet;
use std::path::Path;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::Classification;
use crate::error::TrackerError;
use crate::types::AnalysisStatus;

pub const DEFAULT_PATH_COLUMN: &str = "remote_log_directory";
pub const DEFAULT_RESULTS_PREFIX: &str = "analysis_results_";

/// Rows of monitored jobs. Column and row order are preserved; blank cells
/// are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tracker {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Tracker {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TrackerError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TrackerError::DuplicateColumn(column.clone()));
            }
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(TrackerError::RowWidth {
                    row,
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|values| values[idx].as_str())
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|values| values[idx].as_str()).collect())
    }

    /// The row's remote path, if present and not blank.
    pub fn remote_path(&self, row: usize, path_column: &str) -> Option<&str> {
        self.value(row, path_column)
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }

    /// Inserts a column at `position` (clamped to the end) filled with `fill`.
    pub fn insert_column(&mut self, position: usize, name: &str, fill: &str) -> usize {
        let position = position.min(self.columns.len());
        self.columns.insert(position, name.to_string());
        for values in &mut self.rows {
            values.insert(position, fill.to_string());
        }
        position
    }

    fn fill_column(&mut self, idx: usize, fill: &str) {
        for values in &mut self.rows {
            values[idx] = fill.to_string();
        }
    }

    fn set(&mut self, row: usize, idx: usize, value: &str) {
        self.rows[row][idx] = value.to_string();
    }
}

/// Name of the results column for a `YYYYMMDD` date.
pub fn results_column(prefix: &str, date_string: &str) -> String {
    format!("{prefix}{date_string}")
}

/// Job identifier derived from a downloaded filename: the part before the
/// first hyphen, or the stem when there is no hyphen.
pub fn base_job_id(filename: &str) -> &str {
    match filename.split_once('-') {
        Some((base, _)) => base,
        None => Path::new(filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(filename),
    }
}

/// Final segment of a remote path, ignoring trailing separators.
pub fn path_identifier(remote_path: &str) -> &str {
    let trimmed = remote_path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Writes classification results into the dated column.
pub struct TrackerMerger<'a> {
    path_column: &'a str,
    results_prefix: &'a str,
}

impl<'a> TrackerMerger<'a> {
    pub fn new(path_column: &'a str, results_prefix: &'a str) -> Self {
        Self {
            path_column,
            results_prefix,
        }
    }

    /// Resets (or inserts) the dated column, writes matched statuses and fills
    /// the remaining rows with a fallback status.
    ///
    /// Classification entries are applied in filename order, so when two files
    /// derive the same job identifier the lexicographically greatest one wins.
    pub fn merge(
        &self,
        mut tracker: Tracker,
        classification: &Classification,
        date_string: &str,
        problem_paths: &IndexSet<String>,
    ) -> Tracker {
        let column = results_column(self.results_prefix, date_string);
        let not_analyzed = AnalysisStatus::NotAnalyzed.as_str();
        info!("Updating tracker with results in column {}", column);

        let results_idx = match tracker.column_index(&column) {
            Some(idx) => {
                info!("Resetting existing results column {}", column);
                tracker.fill_column(idx, not_analyzed);
                idx
            }
            None => {
                let position = tracker
                    .column_index(self.path_column)
                    .map(|idx| idx + 1)
                    .unwrap_or(tracker.columns.len());
                let idx = tracker.insert_column(position, &column, not_analyzed);
                info!("Added results column {} at position {}", column, idx);
                idx
            }
        };

        let identifiers: Vec<Option<String>> = (0..tracker.len())
            .map(|row| {
                tracker
                    .remote_path(row, self.path_column)
                    .map(|path| path_identifier(path).to_string())
            })
            .collect();

        for (filename, status) in classification {
            let job_id = base_job_id(filename);
            let matched: Vec<usize> = identifiers
                .iter()
                .enumerate()
                .filter(|(_, id)| id.as_deref() == Some(job_id))
                .map(|(row, _)| row)
                .collect();

            if matched.is_empty() {
                warn!(
                    "Could not match log file '{}' to any tracker row (identifier '{}')",
                    filename, job_id
                );
                continue;
            }
            for &row in &matched {
                tracker.set(row, results_idx, status.as_str());
            }
            info!(
                "Matched '{}' ({}) to {} tracker rows {:?}",
                filename,
                status,
                matched.len(),
                matched
            );
        }

        for row in 0..tracker.len() {
            if tracker.rows[row][results_idx] != not_analyzed {
                continue;
            }
            let fallback = match tracker.remote_path(row, self.path_column) {
                Some(path) if problem_paths.contains(path) => AnalysisStatus::AccessError,
                Some(_) => AnalysisStatus::LogNotFoundOrAnalyzed,
                None => AnalysisStatus::MissingPath,
            };
            debug!("Row {}: marked as '{}'", row, fallback);
            tracker.set(row, results_idx, fallback.as_str());
        }

        info!("Tracker update finished");
        tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(paths: &[&str]) -> Tracker {
        let columns = ["remote_log_directory", "project", "department", "job_name"]
            .map(String::from)
            .to_vec();
        let rows = paths
            .iter()
            .map(|path| {
                let job = path_identifier(path).to_string();
                vec![
                    path.to_string(),
                    "finance".to_string(),
                    "billing".to_string(),
                    job,
                ]
            })
            .collect();
        Tracker::new(columns, rows).expect("tracker")
    }

    fn merger() -> TrackerMerger<'static> {
        TrackerMerger::new(DEFAULT_PATH_COLUMN, DEFAULT_RESULTS_PREFIX)
    }

    fn classification(entries: &[(&str, AnalysisStatus)]) -> Classification {
        entries
            .iter()
            .map(|(name, status)| (name.to_string(), *status))
            .collect()
    }

    #[test]
    fn test_new_rejects_ragged_rows_and_duplicate_columns() {
        let err = Tracker::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()]],
        )
        .expect_err("ragged");
        assert_eq!(
            err,
            TrackerError::RowWidth {
                row: 0,
                expected: 2,
                actual: 1
            }
        );

        let err = Tracker::new(vec!["a".into(), "a".into()], vec![]).expect_err("dup");
        assert_eq!(err, TrackerError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_base_job_id_and_path_identifier() {
        assert_eq!(
            base_job_id("job_invoice_gen-20250505_120000.log"),
            "job_invoice_gen"
        );
        assert_eq!(base_job_id("job_invoice_gen.log"), "job_invoice_gen");
        assert_eq!(base_job_id("archive.tar.gz"), "archive.tar");
        assert_eq!(base_job_id("noext"), "noext");

        assert_eq!(
            path_identifier("/logs/finance/billing/job_invoice_gen"),
            "job_invoice_gen"
        );
        assert_eq!(
            path_identifier("/logs/finance/billing/job_invoice_gen//"),
            "job_invoice_gen"
        );
        assert_eq!(path_identifier("job_only"), "job_only");
    }

    #[test]
    fn test_merge_adds_column_after_path_column() {
        let merged = merger().merge(
            tracker(&["/logs/finance/billing/job_invoice_gen"]),
            &classification(&[(
                "job_invoice_gen-20250505_120000.log",
                AnalysisStatus::Success,
            )]),
            "20250505",
            &IndexSet::new(),
        );
        assert_eq!(merged.columns()[1], "analysis_results_20250505");
        assert_eq!(
            merged.value(0, "analysis_results_20250505"),
            Some("success")
        );
        assert_eq!(merged.value(0, "project"), Some("finance"));
    }

    #[test]
    fn test_merge_appends_column_when_path_column_absent() {
        let base = Tracker::new(
            vec!["job_name".into()],
            vec![vec!["job_a".into()]],
        )
        .expect("tracker");
        let merged = merger().merge(base, &Classification::new(), "20250505", &IndexSet::new());
        assert_eq!(merged.columns(), &["job_name", "analysis_results_20250505"]);
        assert_eq!(
            merged.value(0, "analysis_results_20250505"),
            Some("missing_path")
        );
    }

    #[test]
    fn test_merge_marks_access_error_for_problem_path() {
        let path = "/logs/finance/billing/job_invoice_gen";
        let problems: IndexSet<String> = [path.to_string()].into_iter().collect();
        let merged = merger().merge(tracker(&[path]), &Classification::new(), "20250505", &problems);
        assert_eq!(
            merged.value(0, "analysis_results_20250505"),
            Some("access_error")
        );
    }

    #[test]
    fn test_merge_marks_missing_path_for_blank_rows() {
        let merged = merger().merge(
            tracker(&["", "   "]),
            &Classification::new(),
            "20250505",
            &IndexSet::new(),
        );
        assert_eq!(
            merged.column_values("analysis_results_20250505"),
            Some(vec!["missing_path", "missing_path"])
        );
    }

    #[test]
    fn test_merge_marks_unmatched_rows_not_found() {
        let merged = merger().merge(
            tracker(&["/logs/finance/billing/job_tax_calc"]),
            &classification(&[("job_invoice_gen-20250505_1.log", AnalysisStatus::Success)]),
            "20250505",
            &IndexSet::new(),
        );
        assert_eq!(
            merged.value(0, "analysis_results_20250505"),
            Some("log_not_found_or_analyzed")
        );
    }

    #[test]
    fn test_merge_writes_same_status_to_rows_sharing_a_directory() {
        let path = "/logs/finance/billing/job_invoice_gen/";
        let merged = merger().merge(
            tracker(&[path, "/logs/finance/billing/job_invoice_gen"]),
            &classification(&[("job_invoice_gen-20250505_1.log", AnalysisStatus::Failure)]),
            "20250505",
            &IndexSet::new(),
        );
        assert_eq!(
            merged.column_values("analysis_results_20250505"),
            Some(vec!["failure", "failure"])
        );
    }

    #[test]
    fn test_merge_twice_resets_existing_column() {
        let path = "/logs/finance/billing/job_invoice_gen";
        let first = merger().merge(
            tracker(&[path]),
            &classification(&[("job_invoice_gen-20250505_1.log", AnalysisStatus::Success)]),
            "20250505",
            &IndexSet::new(),
        );
        let second = merger().merge(first, &Classification::new(), "20250505", &IndexSet::new());

        let results: Vec<_> = second
            .columns()
            .iter()
            .filter(|c| c.starts_with(DEFAULT_RESULTS_PREFIX))
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(
            second.value(0, "analysis_results_20250505"),
            Some("log_not_found_or_analyzed")
        );
    }

    #[test]
    fn test_merge_keeps_previous_dates_untouched() {
        let path = "/logs/finance/billing/job_invoice_gen";
        let first = merger().merge(
            tracker(&[path]),
            &classification(&[("job_invoice_gen-20250504_1.log", AnalysisStatus::Error)]),
            "20250504",
            &IndexSet::new(),
        );
        let second = merger().merge(
            first,
            &classification(&[("job_invoice_gen-20250505_1.log", AnalysisStatus::Success)]),
            "20250505",
            &IndexSet::new(),
        );
        assert_eq!(
            second.columns()[1..3],
            ["analysis_results_20250505", "analysis_results_20250504"]
        );
        assert_eq!(second.value(0, "analysis_results_20250504"), Some("error"));
        assert_eq!(second.value(0, "analysis_results_20250505"), Some("success"));
    }

    #[test]
    fn test_merge_conflicting_files_resolve_to_greatest_filename() {
        let merged = merger().merge(
            tracker(&["/logs/finance/billing/job_invoice_gen"]),
            &classification(&[
                ("job_invoice_gen-20250505_235959.log", AnalysisStatus::Failure),
                ("job_invoice_gen-20250505_080000.log", AnalysisStatus::Success),
            ]),
            "20250505",
            &IndexSet::new(),
        );
        assert_eq!(
            merged.value(0, "analysis_results_20250505"),
            Some("failure")
        );
    }

    #[test]
    fn test_matched_row_is_not_overridden_by_problem_path() {
        let path = "/logs/finance/billing/job_invoice_gen";
        let problems: IndexSet<String> = [path.to_string()].into_iter().collect();
        let merged = merger().merge(
            tracker(&[path]),
            &classification(&[("job_invoice_gen-20250505_1.log", AnalysisStatus::Unknown)]),
            "20250505",
            &problems,
        );
        assert_eq!(merged.value(0, "analysis_results_20250505"), Some("unknown"));
    }
}
