//! Storage backends for the knowledge graph

mod seed;
mod sqlite;
mod traits;

pub use seed::seed_reference_data;
pub use sqlite::SqliteStore;
pub use traits::{EntityFilter, GraphStore, OpenStore, StorageError, StorageResult};
