use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use logtrack_core::error::StoreError;
use logtrack_core::store::TrackerStore;
use logtrack_core::tracker::Tracker;

const MEMORY_PATH: &str = "<memory>";

/// Tracker held in memory. Clones share the same table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTrackerStore {
    tracker: Arc<RwLock<Option<Tracker>>>,
}

impl InMemoryTrackerStore {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker: Arc::new(RwLock::new(Some(tracker))),
        }
    }

    /// Current table, if any was stored.
    pub fn snapshot(&self) -> Option<Tracker> {
        self.tracker.read().ok().and_then(|guard| guard.clone())
    }
}

impl TrackerStore for InMemoryTrackerStore {
    fn describe(&self) -> String {
        MEMORY_PATH.to_string()
    }

    fn load(&self, required_column: &str) -> Result<Tracker, StoreError> {
        let tracker = self.snapshot().ok_or_else(|| StoreError::NotFound {
            path: PathBuf::from(MEMORY_PATH),
        })?;
        if !tracker.has_column(required_column) {
            return Err(StoreError::MissingColumn {
                path: PathBuf::from(MEMORY_PATH),
                column: required_column.to_string(),
            });
        }
        Ok(tracker)
    }

    fn save(&self, tracker: &Tracker) -> Result<(), StoreError> {
        let mut guard = self.tracker.write().map_err(|_| StoreError::WriteFile {
            path: PathBuf::from(MEMORY_PATH),
            source: std::io::Error::other("tracker lock poisoned"),
        })?;
        *guard = Some(tracker.clone());
        Ok(())
    }
}
