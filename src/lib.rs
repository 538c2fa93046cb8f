//! # mnema
//!
//! Self-knowledge graph engine for an AI agent. Sessions, insights, beliefs,
//! patterns, and friction points are recorded as typed entities and
//! relationships in a SQLite-backed graph, then consolidated, pruned, and
//! pathway-mapped by three librarian maintenance jobs. A significance engine
//! watches accumulated signals and proposes evolution when thresholds cross.
//!
//! ## Layout
//!
//! - [`graph`] — typed entities and relationships
//! - [`storage`] — `GraphStore` trait and the SQLite backend
//! - [`embeddings`] — embedding provider trait and cosine similarity
//! - [`telemetry`] — append-only JSONL event sink
//! - [`api`] — knowledge-write operations (sessions, journal, friction, reflection)
//! - [`librarian`] — synthesizer, protector, pathfinder, and the significance engine
//! - [`mcp`] — Model Context Protocol server surface

pub mod api;
pub mod embeddings;
pub mod graph;
pub mod librarian;
pub mod mcp;
pub mod storage;
pub mod telemetry;

pub use api::{ApiError, KnowledgeApi};
pub use embeddings::{cosine_similarity, DisabledEmbedder, Embedder, EmbeddingError};
#[cfg(feature = "embeddings")]
pub use embeddings::FastEmbedEmbedder;
pub use graph::{
    Entity, EntityId, EntityKind, Properties, PropertyValue, Relationship, RelationshipId,
    RelationshipKind,
};
pub use librarian::{
    DirProposalStore, Findings, Librarians, PatternCheck, ProposalStore, Significance, StepOutcome,
};
pub use storage::{
    seed_reference_data, EntityFilter, GraphStore, OpenStore, SqliteStore, StorageError,
};
pub use telemetry::{TelemetryEvent, TelemetrySink};

/// Crate version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
