//! One analysis run: load, fetch, classify, merge, save.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::classify::classify_directory;
use crate::config::AnalyzerConfig;
use crate::dates::create_download_dir;
use crate::error::AnalyzeResult;
use crate::fetch::{RemoteConnector, fetch_latest};
use crate::store::TrackerStore;
use crate::tracker::{Tracker, TrackerMerger, results_column};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub date: String,
    pub results_column: String,
    pub tracker_rows: usize,
    pub download_dir: PathBuf,
    pub downloaded: usize,
    pub skipped_duplicates: usize,
    pub problem_paths: Vec<String>,
    pub status_counts: BTreeMap<String, usize>,
}

/// Counts each value of `column`; empty when the column is absent.
pub fn count_statuses(tracker: &Tracker, column: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in tracker.column_values(column).unwrap_or_default() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

pub struct Analyzer<'a> {
    config: &'a AnalyzerConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: &'a AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn run<S, C>(&self, store: &S, connector: &C, date_string: &str) -> AnalyzeResult<RunSummary>
    where
        S: TrackerStore + ?Sized,
        C: RemoteConnector,
    {
        let config = self.config;

        info!("Step 1: loading tracker from {}", store.describe());
        let tracker = store.load(&config.path_column)?;
        info!("Tracker loaded with {} rows", tracker.len());

        info!("Step 2: preparing local download directory");
        let download_dir = create_download_dir(&config.download_base, date_string)?;
        info!("Local directory for {} logs: {}", date_string, download_dir.display());

        info!("Step 3: downloading logs");
        let report = fetch_latest(&tracker, &config.path_column, connector, &download_dir)?;
        if !report.problem_paths.is_empty() {
            warn!(
                "Issues encountered downloading logs for {} paths",
                report.problem_paths.len()
            );
        }

        info!("Step 4: analyzing downloaded logs");
        let classification = classify_directory(&download_dir)?;

        info!("Step 5: updating tracker");
        let merger = TrackerMerger::new(&config.path_column, &config.results_prefix);
        let updated = merger.merge(tracker, &classification, date_string, &report.problem_paths);

        info!("Step 6: saving tracker to {}", store.describe());
        store.save(&updated)?;
        info!("Updated tracker saved");

        let column = results_column(&config.results_prefix, date_string);
        Ok(RunSummary {
            date: date_string.to_string(),
            status_counts: count_statuses(&updated, &column),
            results_column: column,
            tracker_rows: updated.len(),
            download_dir,
            downloaded: report.downloaded.len(),
            skipped_duplicates: report.skipped_duplicates.len(),
            problem_paths: report.problem_paths.into_iter().collect(),
        })
    }
}
