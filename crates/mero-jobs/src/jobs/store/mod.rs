mod memory;
mod sqlite;

pub use memory::{InMemoryJobStore, InMemoryNotifier};
pub use sqlite::SqliteJobStore;
