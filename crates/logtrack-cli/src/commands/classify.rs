use std::path::PathBuf;

use clap::Args;

use logtrack_core::classify::classify_directory;
use logtrack_core::error::AnalyzeResult;

#[derive(Args)]
pub struct Classify {
    /// Directory holding downloaded log files
    pub dir: PathBuf,

    /// Print the mapping as JSON
    #[arg(long)]
    pub json: bool,
}

impl Classify {
    pub fn execute(self) -> AnalyzeResult<()> {
        let results = classify_directory(&self.dir)?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&results).map_err(anyhow::Error::from)?
            );
        } else if results.is_empty() {
            println!("No log files found in {}", self.dir.display());
        } else {
            println!("{:<60} {:<12}", "File", "Status");
            println!("{}", "-".repeat(73));
            for (file, status) in &results {
                println!("{:<60} {:<12}", file, status);
            }
        }
        Ok(())
    }
}
