//! Librarian maintenance engines
//!
//! Three scheduled jobs keep the graph healthy: the synthesizer consolidates
//! raw data into knowledge, the protector enforces structural and temporal
//! hygiene, and the pathfinder maps connectivity for retrieval planning. A
//! significance engine reads the same graph to decide when accumulated
//! signals warrant an evolution proposal.

pub mod pathfinder;
pub mod proposal;
pub mod protector;
pub mod significance;
pub mod synthesizer;

pub use pathfinder::PathfinderOutcome;
pub use proposal::{DirProposalStore, ProposalError, ProposalStore};
pub use protector::ProtectionOutcome;
pub use significance::{Findings, PatternCheck, Significance};
pub use synthesizer::SynthesisOutcome;

use crate::embeddings::Embedder;
use crate::storage::GraphStore;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Result of one best-effort sub-step within a maintenance run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied { detail: String },
    Skipped { step: String, reason: String },
}

impl StepOutcome {
    pub fn applied(detail: impl Into<String>) -> Self {
        StepOutcome::Applied {
            detail: detail.into(),
        }
    }

    pub fn skipped(step: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        StepOutcome::Skipped {
            step: step.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Applied { detail } => write!(f, "applied: {}", detail),
            StepOutcome::Skipped { step, reason } => write!(f, "skipped {}: {}", step, reason),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LibrarianRunOutcome {
    pub synthesis: SynthesisOutcome,
    pub protection: ProtectionOutcome,
    pub pathways: PathfinderOutcome,
}

/// Explicitly constructed context for maintenance runs. The store does not
/// promise multi-writer isolation, so `run_lock` serializes runs globally:
/// one maintenance job or significance check at a time.
pub struct Librarians {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    proposals: Arc<dyn ProposalStore>,
    run_lock: Mutex<()>,
}

impl Librarians {
    pub fn new(
        store: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
        proposals: Arc<dyn ProposalStore>,
    ) -> Self {
        Self {
            store,
            embedder,
            proposals,
            run_lock: Mutex::new(()),
        }
    }

    pub fn run_synthesizer(&self) -> SynthesisOutcome {
        let _guard = self.run_lock.lock().unwrap();
        info!("synthesizer run starting");
        synthesizer::run(self.store.as_ref(), self.embedder.as_ref())
    }

    pub fn run_protector(&self) -> ProtectionOutcome {
        let _guard = self.run_lock.lock().unwrap();
        info!("protector run starting");
        protector::run(self.store.as_ref())
    }

    pub fn run_pathfinder(&self) -> PathfinderOutcome {
        let _guard = self.run_lock.lock().unwrap();
        info!("pathfinder run starting");
        pathfinder::run(self.store.as_ref())
    }

    pub fn run_all(&self) -> LibrarianRunOutcome {
        let _guard = self.run_lock.lock().unwrap();
        info!("full librarian run starting");
        LibrarianRunOutcome {
            synthesis: synthesizer::run(self.store.as_ref(), self.embedder.as_ref()),
            protection: protector::run(self.store.as_ref()),
            pathways: pathfinder::run(self.store.as_ref()),
        }
    }

    /// Significance check, optionally writing evolution proposals.
    pub fn pattern_check(&self, session_id: Option<&str>, generate_proposals: bool) -> PatternCheck {
        let _guard = self.run_lock.lock().unwrap();
        significance::pattern_check(
            self.store.as_ref(),
            self.proposals.as_ref(),
            session_id,
            generate_proposals,
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::graph::{
        Entity, EntityId, EntityKind, PropertyValue, Relationship, RelationshipId,
        RelationshipKind,
    };
    use crate::storage::{
        EntityFilter, GraphStore, OpenStore, SqliteStore, StorageError, StorageResult,
    };

    /// Delegating store whose `find_entities` fails for one entity kind.
    /// Drives the degraded-query paths a healthy backend never takes.
    pub struct FailingKindStore {
        inner: SqliteStore,
        fail_kind: EntityKind,
    }

    impl FailingKindStore {
        pub fn new(fail_kind: EntityKind) -> Self {
            Self {
                inner: SqliteStore::open_in_memory().unwrap(),
                fail_kind,
            }
        }
    }

    impl GraphStore for FailingKindStore {
        fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
            self.inner.save_entity(entity)
        }

        fn load_entity(&self, id: &EntityId) -> StorageResult<Option<Entity>> {
            self.inner.load_entity(id)
        }

        fn delete_entity(&self, id: &EntityId) -> StorageResult<bool> {
            self.inner.delete_entity(id)
        }

        fn set_property(
            &self,
            id: &EntityId,
            key: &str,
            value: PropertyValue,
        ) -> StorageResult<bool> {
            self.inner.set_property(id, key, value)
        }

        fn find_entities(&self, filter: &EntityFilter) -> StorageResult<Vec<Entity>> {
            if filter.kind == Some(self.fail_kind) {
                return Err(StorageError::Database(rusqlite::Error::InvalidQuery));
            }
            self.inner.find_entities(filter)
        }

        fn save_relationship(&self, rel: &Relationship) -> StorageResult<()> {
            self.inner.save_relationship(rel)
        }

        fn ensure_relationship(&self, rel: &Relationship) -> StorageResult<bool> {
            self.inner.ensure_relationship(rel)
        }

        fn relationships_from(&self, id: &EntityId) -> StorageResult<Vec<Relationship>> {
            self.inner.relationships_from(id)
        }

        fn relationships_to(&self, id: &EntityId) -> StorageResult<Vec<Relationship>> {
            self.inner.relationships_to(id)
        }

        fn relationships_of_kind(
            &self,
            kind: RelationshipKind,
        ) -> StorageResult<Vec<Relationship>> {
            self.inner.relationships_of_kind(kind)
        }

        fn all_relationships(&self) -> StorageResult<Vec<Relationship>> {
            self.inner.all_relationships()
        }

        fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<bool> {
            self.inner.delete_relationship(id)
        }

        fn merge_entities(&self, keep: &EntityId, remove: &EntityId) -> StorageResult<()> {
            self.inner.merge_entities(keep, remove)
        }

        fn find_similar(
            &self,
            kind: EntityKind,
            query: &[f32],
            limit: usize,
        ) -> StorageResult<Vec<(Entity, f32)>> {
            self.inner.find_similar(kind, query, limit)
        }

        fn search_text(
            &self,
            kind: EntityKind,
            needle: &str,
            limit: usize,
        ) -> StorageResult<Vec<Entity>> {
            self.inner.search_text(kind, needle, limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::ConstantEmbedder;
    use crate::storage::{OpenStore, SqliteStore};
    use tempfile::TempDir;

    #[test]
    fn run_all_executes_every_engine() {
        let dir = TempDir::new().unwrap();
        let librarians = Librarians::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(ConstantEmbedder::new(vec![1.0])),
            Arc::new(DirProposalStore::new(dir.path()).unwrap()),
        );

        let outcome = librarians.run_all();
        assert_eq!(outcome.synthesis.insights_created, 0);
        assert_eq!(outcome.protection.duplicates_merged, 0);
        assert!(outcome.pathways.hubs.is_empty());
    }

    #[test]
    fn step_outcome_serializes_with_tag() {
        let skipped = StepOutcome::skipped("merge", "store unreachable");
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "store unreachable");
        assert!(skipped.is_skipped());
    }
}
