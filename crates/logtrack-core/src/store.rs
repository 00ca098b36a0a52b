use crate::error::StoreError;
use crate::tracker::Tracker;

/// Persistent home of the tracker table.
///
/// `load` rejects a table lacking `required_column`. `save` overwrites the
/// whole table and reports permission failures as
/// [`StoreError::PermissionDenied`].
pub trait TrackerStore {
    fn describe(&self) -> String;

    fn load(&self, required_column: &str) -> Result<Tracker, StoreError>;

    fn save(&self, tracker: &Tracker) -> Result<(), StoreError>;
}
