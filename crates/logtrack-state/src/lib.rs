mod file;
mod memory;

pub use file::CsvTrackerStore;
pub use memory::InMemoryTrackerStore;
