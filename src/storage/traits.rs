//! Storage trait definitions

use crate::graph::{
    Entity, EntityId, EntityKind, PropertyValue, Relationship, RelationshipId, RelationshipKind,
};
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("unknown entity kind in row: {0}")]
    UnknownKind(String),

    #[error("unknown relationship kind in row: {0}")]
    UnknownRelationship(String),

    #[error("date parsing error: {0}")]
    DateParse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for querying entities
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    /// Filter by entity kind
    pub kind: Option<EntityKind>,
    /// Filter by domain tag
    pub domain: Option<String>,
    /// Filter by exact content match (used for deduplication)
    pub content: Option<String>,
    /// Only entities created strictly before this instant
    pub created_before: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl EntityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn created_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_before = Some(cutoff);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Trait for graph storage backends
///
/// Implementations must be thread-safe (Send + Sync). Note that thread-safety
/// of the handle does not imply multi-writer isolation: maintenance runs are
/// serialized by the caller (see `Librarians`).
pub trait GraphStore: Send + Sync {
    // === Entity Operations ===

    /// Save an entity (insert or update).
    fn save_entity(&self, entity: &Entity) -> StorageResult<()>;

    /// Load an entity by id.
    fn load_entity(&self, id: &EntityId) -> StorageResult<Option<Entity>>;

    /// Detach-delete an entity: removes the entity and every relationship
    /// touching it. Returns false if the id was unknown.
    fn delete_entity(&self, id: &EntityId) -> StorageResult<bool>;

    /// Set a single property on an entity. Returns false if the id was unknown.
    fn set_property(&self, id: &EntityId, key: &str, value: PropertyValue) -> StorageResult<bool>;

    /// Find entities matching filter criteria, ordered by creation time descending.
    fn find_entities(&self, filter: &EntityFilter) -> StorageResult<Vec<Entity>>;

    // === Relationship Operations ===

    /// Save a relationship. Fails with `EntityNotFound` if either endpoint is
    /// missing, mirroring a MATCH-then-CREATE in a graph query language.
    fn save_relationship(&self, rel: &Relationship) -> StorageResult<()>;

    /// Save a relationship unless an edge with the same source, target, and
    /// kind already exists (MERGE semantics). Returns true when created.
    fn ensure_relationship(&self, rel: &Relationship) -> StorageResult<bool>;

    /// Relationships originating from an entity.
    fn relationships_from(&self, id: &EntityId) -> StorageResult<Vec<Relationship>>;

    /// Relationships targeting an entity.
    fn relationships_to(&self, id: &EntityId) -> StorageResult<Vec<Relationship>>;

    /// All relationships of a given kind.
    fn relationships_of_kind(&self, kind: RelationshipKind) -> StorageResult<Vec<Relationship>>;

    /// Every relationship in the graph.
    fn all_relationships(&self) -> StorageResult<Vec<Relationship>>;

    /// Delete a relationship by id. Returns false if unknown.
    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<bool>;

    // === Structural Operations ===

    /// Merge `remove` into `keep`: redirect all incoming and outgoing
    /// relationships from `remove` to `keep`, then delete `remove`.
    ///
    /// Atomic: either the redirections and the deletion all happen, or the
    /// graph is left untouched.
    fn merge_entities(&self, keep: &EntityId, remove: &EntityId) -> StorageResult<()>;

    // === Similarity Search ===

    /// Nearest entities of a kind by cosine similarity over stored embeddings,
    /// best first. Entities without embeddings are skipped.
    fn find_similar(
        &self,
        kind: EntityKind,
        query: &[f32],
        limit: usize,
    ) -> StorageResult<Vec<(Entity, f32)>>;

    /// Case-insensitive substring search over entity content.
    fn search_text(&self, kind: EntityKind, needle: &str, limit: usize) -> StorageResult<Vec<Entity>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
