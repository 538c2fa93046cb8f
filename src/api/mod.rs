//! Knowledge-write operations
//!
//! The operational surface an agent records through: opening and closing
//! sessions, journaling knowledge, logging friction, and reflecting. Each
//! operation stores a primary entity first; secondary edges and telemetry are
//! best-effort, and anything skipped is reported back rather than dropped
//! silently.

mod friction;
mod journal;
mod reflect;
mod session;

pub use friction::FrictionLogged;
pub use journal::{JournalEntry, JournalHit};
pub use reflect::ReflectionResult;
pub use session::{SessionClosed, SessionOpened};

use crate::embeddings::Embedder;
use crate::storage::{GraphStore, StorageError};
use crate::telemetry::{TelemetryEvent, TelemetrySink};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Allowed friction categories.
pub const FRICTION_CATEGORIES: [&str; 5] = [
    "tooling",
    "conceptual",
    "process",
    "environmental",
    "relational",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("invalid value '{given}', allowed: {allowed}")]
    InvalidValue { given: String, allowed: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Explicitly constructed context for knowledge-write operations. Holds the
/// store, embedder, and telemetry handles; no process-wide singletons.
pub struct KnowledgeApi {
    pub(crate) store: Arc<dyn GraphStore>,
    pub(crate) embedder: Arc<dyn Embedder>,
    pub(crate) telemetry: Arc<TelemetrySink>,
}

impl KnowledgeApi {
    pub fn new(
        store: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
        telemetry: Arc<TelemetrySink>,
    ) -> Self {
        Self {
            store,
            embedder,
            telemetry,
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Embed text if a model is available. Absence of embeddings degrades
    /// search quality but never fails a write.
    pub(crate) fn embed_optional(&self, text: &str) -> Option<Vec<f32>> {
        match self.embedder.embed(text) {
            Ok(vector) => Some(vector),
            Err(e) => {
                tracing::debug!("embedding unavailable: {}", e);
                None
            }
        }
    }

    pub(crate) fn emit(&self, event: &TelemetryEvent) {
        if let Err(e) = self.telemetry.record(event) {
            warn!("telemetry write failed: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::embeddings::ConstantEmbedder;
    use crate::storage::{OpenStore, SqliteStore};
    use tempfile::TempDir;

    /// Api over an in-memory store with a fixed-vector embedder.
    pub fn api_with_embedder(vector: Vec<f32>) -> (KnowledgeApi, TempDir) {
        let dir = TempDir::new().unwrap();
        let api = KnowledgeApi::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(ConstantEmbedder::new(vector)),
            Arc::new(TelemetrySink::new(dir.path()).unwrap()),
        );
        (api, dir)
    }

    pub fn api() -> (KnowledgeApi, TempDir) {
        api_with_embedder(vec![1.0, 0.0, 0.0])
    }
}
