use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{error, info};

use crate::error::{AnalyzeError, ConfigError};

/// Today's local date as `YYYYMMDD`.
pub fn current_date_string() -> String {
    Local::now().format("%Y%m%d").to_string()
}

/// Accepts only real calendar dates written as eight digits.
pub fn validate_date_string(date: &str) -> Result<String, ConfigError> {
    let digits = date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit());
    if digits && NaiveDate::parse_from_str(date, "%Y%m%d").is_ok() {
        Ok(date.to_string())
    } else {
        Err(ConfigError::InvalidDate(date.to_string()))
    }
}

/// `<base>/<YYYYMMDD>_logs`, created if missing. Reuses an existing directory.
pub fn create_download_dir(base: &Path, date_string: &str) -> Result<PathBuf, AnalyzeError> {
    let dir = base.join(format!("{date_string}_logs"));
    if !dir.is_dir() {
        fs::create_dir_all(&dir).map_err(|source| {
            error!("Failed to create directory {}: {}", dir.display(), source);
            AnalyzeError::DownloadDir {
                path: dir.clone(),
                source,
            }
        })?;
        info!("Created local log directory {}", dir.display());
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_current_date_string_shape() {
        let today = current_date_string();
        assert_eq!(today.len(), 8);
        assert!(today.chars().all(|c| c.is_ascii_digit()));
        assert!(validate_date_string(&today).is_ok());
    }

    #[test]
    fn test_validate_date_string() {
        assert_eq!(validate_date_string("20250505"), Ok("20250505".to_string()));
        assert!(validate_date_string("20250230").is_err());
        assert!(validate_date_string("2025-05-05").is_err());
        assert!(validate_date_string("2025055").is_err());
        assert!(validate_date_string("+2025055").is_err());
    }

    #[test]
    fn test_create_download_dir_is_idempotent() {
        let base = TempDir::new().expect("tempdir");
        let first = create_download_dir(base.path(), "20250101").expect("create");
        let second = create_download_dir(base.path(), "20250101").expect("reuse");
        assert_eq!(first, second);
        assert!(first.is_dir());
        assert!(first.ends_with("20250101_logs"));
    }

    #[test]
    fn test_create_download_dir_fails_under_a_file() {
        let base = TempDir::new().expect("tempdir");
        let blocker = base.path().join("blocker");
        fs::write(&blocker, "not a dir").expect("write");
        let err = create_download_dir(&blocker, "20250101").expect_err("under file");
        assert_eq!(err.exit_code(), 5);
    }
}
