use clap::Subcommand;

pub mod analyze;
pub mod classify;
pub mod status;

pub use analyze::Analyze;
pub use classify::Classify;
pub use status::Status;

#[derive(Subcommand)]
pub enum Commands {
    /// Download the newest logs, classify them and update the tracker
    Analyze(Analyze),

    /// Classify the logs already present in a local directory
    Classify(Classify),

    /// Show one date's results column of the tracker
    Status(Status),
}
