use std::path::PathBuf;

use clap::Args;

use logtrack_core::config::AnalyzerConfig;
use logtrack_core::dates::{current_date_string, validate_date_string};
use logtrack_core::error::{AnalyzeResult, StoreError};
use logtrack_core::pipeline::count_statuses;
use logtrack_core::store::TrackerStore;
use logtrack_core::tracker::results_column;
use logtrack_state::CsvTrackerStore;

#[derive(Args)]
pub struct Status {
    /// Tracker CSV file
    #[arg(short, long)]
    pub tracker: Option<PathBuf>,

    /// Date of the results column (YYYYMMDD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,
}

impl Status {
    pub fn execute(self, config: AnalyzerConfig) -> AnalyzeResult<()> {
        let path = self.tracker.unwrap_or(config.tracker_path);
        let date = match self.date {
            Some(date) => validate_date_string(&date)?,
            None => current_date_string(),
        };

        let tracker = CsvTrackerStore::new(&path).load(&config.path_column)?;
        let column = results_column(&config.results_prefix, &date);
        if !tracker.has_column(&column) {
            return Err(StoreError::MissingColumn { path, column }.into());
        }

        println!("{:<60} {:<28}", "Remote path", "Status");
        println!("{}", "-".repeat(89));
        for row in 0..tracker.len() {
            println!(
                "{:<60} {:<28}",
                tracker.remote_path(row, &config.path_column).unwrap_or("-"),
                tracker.value(row, &column).unwrap_or("")
            );
        }
        println!();
        for (status, count) in count_statuses(&tracker, &column) {
            println!("{:<28} {:>6}", status, count);
        }
        Ok(())
    }
}
