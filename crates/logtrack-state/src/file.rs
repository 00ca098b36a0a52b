use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{error, info};

use logtrack_core::error::StoreError;
use logtrack_core::store::TrackerStore;
use logtrack_core::tracker::Tracker;

/// Tracker kept in a CSV file whose header row names the columns.
#[derive(Debug, Clone)]
pub struct CsvTrackerStore {
    path: PathBuf,
}

impl CsvTrackerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_error(&self, message: impl ToString) -> StoreError {
        StoreError::Parse {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }

    fn read(&self) -> Result<Tracker, StoreError> {
        let file = File::open(&self.path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                StoreError::ReadFile {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(file);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| self.parse_error(e))?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            return Err(self.parse_error("tracker has no header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.parse_error(e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Tracker::new(columns, rows).map_err(|e| self.parse_error(e))
    }

    /// Stages the CSV next to the tracker and renames it into place, so an
    /// interrupted write leaves the previous tracker intact.
    fn write(&self, tracker: &Tracker) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::from_write(&self.path, source);

        let existing = match fs::metadata(&self.path) {
            Ok(meta) => Some(meta.permissions()),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(write_err(err)),
        };
        if existing.as_ref().is_some_and(|perms| perms.readonly()) {
            return Err(write_err(io::Error::new(
                ErrorKind::PermissionDenied,
                "tracker file is read-only",
            )));
        }

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let staged = NamedTempFile::new_in(dir).map_err(write_err)?;
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(staged);

        let to_store_error = |e: csv::Error| {
            let source = match e.into_kind() {
                csv::ErrorKind::Io(io) => io,
                other => io::Error::other(format!("{other:?}")),
            };
            write_err(source)
        };

        writer
            .write_record(tracker.columns())
            .map_err(to_store_error)?;
        for row in tracker.rows() {
            writer.write_record(row).map_err(to_store_error)?;
        }
        let staged = writer
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;
        staged.as_file().sync_all().map_err(write_err)?;
        if let Some(perms) = existing {
            fs::set_permissions(staged.path(), perms).map_err(write_err)?;
        }
        staged.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl TrackerStore for CsvTrackerStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self, required_column: &str) -> Result<Tracker, StoreError> {
        info!("Loading tracker file {}", self.path.display());
        let tracker = self.read().inspect_err(|err| error!("{}", err))?;
        info!(
            "Loaded tracker with {} rows and {} columns",
            tracker.len(),
            tracker.columns().len()
        );

        if !tracker.has_column(required_column) {
            let err = StoreError::MissingColumn {
                path: self.path.clone(),
                column: required_column.to_string(),
            };
            error!("{}", err);
            return Err(err);
        }
        Ok(tracker)
    }

    fn save(&self, tracker: &Tracker) -> Result<(), StoreError> {
        info!("Saving tracker to {}", self.path.display());
        self.write(tracker).inspect_err(|err| error!("{}", err))?;
        info!("Tracker saved to {}", self.path.display());
        Ok(())
    }
}
