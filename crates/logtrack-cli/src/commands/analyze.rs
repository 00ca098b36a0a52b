use std::path::PathBuf;

use clap::Args;
use tracing::info;

use logtrack_core::config::{AnalyzerConfig, Credentials};
use logtrack_core::dates::{current_date_string, validate_date_string};
use logtrack_core::error::AnalyzeResult;
use logtrack_core::pipeline::{Analyzer, RunSummary};
use logtrack_core::store::TrackerStore;
use logtrack_remote::{LocalMirror, SftpConnector};
use logtrack_state::{CsvTrackerStore, InMemoryTrackerStore};

#[derive(Args)]
pub struct Analyze {
    /// Tracker CSV file
    #[arg(short, long)]
    pub tracker: Option<PathBuf>,

    /// Base directory for the per-date download directories
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    /// Date of the results column (YYYYMMDD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Read remote paths from this local directory tree instead of SFTP
    #[arg(long)]
    pub local_root: Option<PathBuf>,

    /// SFTP server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Fetch and classify, but leave the tracker file untouched
    #[arg(long)]
    pub dry_run: bool,
}

impl Analyze {
    fn apply(&self, config: &mut AnalyzerConfig) {
        if let Some(tracker) = &self.tracker {
            config.tracker_path = tracker.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_base = dir.clone();
        }
        if let Some(port) = self.port {
            config.sftp_port = port;
        }
    }

    pub fn execute(self, mut config: AnalyzerConfig) -> AnalyzeResult<()> {
        info!("--- Starting remote log analysis ---");
        self.apply(&mut config);

        let date = match &self.date {
            Some(date) => validate_date_string(date)?,
            None => current_date_string(),
        };
        let csv_store = CsvTrackerStore::new(&config.tracker_path);
        let dry_store;
        let store: &dyn TrackerStore = if self.dry_run {
            info!(
                "Dry run: {} will not be modified",
                csv_store.path().display()
            );
            dry_store = InMemoryTrackerStore::new(csv_store.load(&config.path_column)?);
            &dry_store
        } else {
            &csv_store
        };
        let analyzer = Analyzer::new(&config);

        let summary = match &self.local_root {
            Some(root) => analyzer.run(store, &LocalMirror::new(root), &date)?,
            None => {
                let credentials = Credentials::from_env()?;
                let connector =
                    SftpConnector::new(credentials, config.sftp_port, config.connect_timeout());
                analyzer.run(store, &connector, &date)?
            }
        };

        print_summary(&summary, self.json)?;
        info!("--- Remote log analysis finished successfully ---");
        Ok(())
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Results column {} ({} rows, {} logs downloaded, {} duplicates skipped)",
        summary.results_column, summary.tracker_rows, summary.downloaded, summary.skipped_duplicates
    );
    println!("{:<28} {:>6}", "Status", "Rows");
    println!("{}", "-".repeat(35));
    for (status, count) in &summary.status_counts {
        println!("{:<28} {:>6}", status, count);
    }
    if !summary.problem_paths.is_empty() {
        println!("Problem paths:");
        for path in &summary.problem_paths {
            println!("  {path}");
        }
    }
    Ok(())
}
