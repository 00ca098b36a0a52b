mod commands;
mod logging;

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use commands::Commands;
use logging::LogContext;
use logtrack_core::config::AnalyzerConfig;
use logtrack_core::error::{AnalyzeError, AnalyzeResult};

#[derive(Parser)]
#[command(name = "logtrack")]
#[command(about = "Fetch the newest job logs, classify them and record the results in a tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional config file path (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Application log file (defaults to the configured one)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Only log to the console
    #[arg(long, global = true)]
    no_log_file: bool,
}

fn resolve_config(path: Option<&Path>) -> AnalyzeResult<AnalyzerConfig> {
    match path {
        Some(path) => Ok(AnalyzerConfig::from_yaml_file(path)?),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn resolve_log_file(cli: &Cli, config: Option<&AnalyzerConfig>) -> Option<PathBuf> {
    if cli.no_log_file {
        return None;
    }
    cli.log_file
        .clone()
        .or_else(|| config.map(|c| c.app_log_file.clone()))
}

fn dispatch(command: Commands, config: AnalyzerConfig) -> AnalyzeResult<()> {
    match command {
        Commands::Analyze(cmd) => cmd.execute(config),
        Commands::Classify(cmd) => cmd.execute(),
        Commands::Status(cmd) => cmd.execute(config),
    }
}

/// Runs a command, reporting a panic as an unexpected failure.
fn run_guarded<F>(command: F) -> AnalyzeResult<()>
where
    F: FnOnce() -> AnalyzeResult<()>,
{
    panic::catch_unwind(AssertUnwindSafe(command)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Err(anyhow::anyhow!("command panicked: {message}").into())
    })
}

fn main() -> ExitCode {
    // A local .env may supply SSH_* and LOGTRACK_* values; real env vars win.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref());

    let log_file = resolve_log_file(&cli, config.as_ref().ok());
    let _logging = match LogContext::init(&cli.log_level, log_file.as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("logging to file disabled: {err:#}");
            LogContext::console_only(&cli.log_level)
        }
    };

    match &dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(err) => debug!("No .env file loaded: {}", err),
    }

    let command = cli.command;
    let exit_code = match config.and_then(|config| run_guarded(|| dispatch(command, config))) {
        Ok(()) => 0,
        Err(err) => report_failure(&err),
    };
    info!("logtrack finished with exit code {}", exit_code);
    ExitCode::from(exit_code)
}

fn report_failure(err: &AnalyzeError) -> u8 {
    let code = err.exit_code();
    match code {
        1 => error!("Configuration or data error: {}", err),
        2 => error!("Critical error: {}", err),
        3 => error!("File system error: {}", err),
        4 => error!("Runtime error during processing: {}", err),
        _ => error!("Unexpected critical error: {:#}", err),
    }
    eprintln!("error: {err}");
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtrack_core::error::ConfigError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse_analyze_flags() {
        let cli = Cli::parse_from([
            "logtrack",
            "analyze",
            "--date",
            "20250505",
            "--local-root",
            "/srv/mirror",
            "--json",
        ]);
        assert_eq!(cli.log_level, "info");
        assert!(!cli.no_log_file);
        match cli.command {
            Commands::Analyze(cmd) => {
                assert_eq!(cmd.date.as_deref(), Some("20250505"));
                assert_eq!(cmd.local_root, Some(PathBuf::from("/srv/mirror")));
                assert!(cmd.json);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["logtrack", "classify", "data/x", "--no-log-file"]);
        assert!(cli.no_log_file);
        assert_eq!(resolve_log_file(&cli, Some(&AnalyzerConfig::default())), None);
    }

    #[test]
    fn test_log_file_flag_beats_config() {
        let cli = Cli::parse_from(["logtrack", "--log-file", "/tmp/a.log", "status"]);
        let config = AnalyzerConfig::default();
        assert_eq!(
            resolve_log_file(&cli, Some(&config)),
            Some(PathBuf::from("/tmp/a.log"))
        );

        let cli = Cli::parse_from(["logtrack", "status"]);
        assert_eq!(resolve_log_file(&cli, Some(&config)), Some(config.app_log_file.clone()));
    }

    #[test]
    fn test_panicking_command_is_unexpected_failure() {
        let err = run_guarded(|| panic!("boom")).expect_err("panic");
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("boom"));

        assert!(run_guarded(|| Ok(())).is_ok());
        let err = run_guarded(|| Err(ConfigError::InvalidDate("x".into()).into()))
            .expect_err("config");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_resolve_config_reads_yaml() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("logtrack.yaml");
        fs::write(&path, "path_column: log_dir\n").expect("write");
        let config = resolve_config(Some(&path)).expect("config");
        assert_eq!(config.path_column, "log_dir");

        let err = resolve_config(Some(&dir.path().join("missing.yaml"))).expect_err("missing");
        assert_eq!(err.exit_code(), 1);
    }
}
