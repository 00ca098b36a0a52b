pub mod classify;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod store;
pub mod tracker;
pub mod types;

pub use classify::{Classification, classify_directory};
pub use config::{AnalyzerConfig, Credentials};
pub use error::{AnalyzeError, AnalyzeResult};
pub use fetch::{FetchReport, RemoteConnector, RemoteSession, fetch_latest};
pub use pipeline::{Analyzer, RunSummary};
pub use store::TrackerStore;
pub use tracker::{Tracker, TrackerMerger};
pub use types::AnalysisStatus;
