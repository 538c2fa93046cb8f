//! Journal: freeform knowledge writes and semantic queries

use super::{ApiError, ApiResult, KnowledgeApi};
use crate::graph::{snippet, Entity, EntityId, EntityKind, Relationship, RelationshipKind};
use crate::telemetry::knowledge_event;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

const CATEGORIES: [&str; 7] = [
    "insight",
    "observation",
    "friction",
    "reflection",
    "experience",
    "decision",
    "question",
];

const DEFAULT_QUERY_KINDS: [EntityKind; 4] = [
    EntityKind::Insight,
    EntityKind::Observation,
    EntityKind::Pattern,
    EntityKind::Belief,
];

#[derive(Debug, Serialize)]
pub struct JournalEntry {
    pub entry_id: String,
    pub kind: String,
    pub embedded: bool,
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct JournalHit {
    pub id: String,
    pub kind: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub score: f32,
}

fn kind_for_category(category: &str) -> Option<EntityKind> {
    match category {
        "insight" => Some(EntityKind::Insight),
        "observation" => Some(EntityKind::Observation),
        "reflection" => Some(EntityKind::Reflection),
        "experience" => Some(EntityKind::Experience),
        "decision" => Some(EntityKind::Decision),
        "question" => Some(EntityKind::Question),
        _ => None,
    }
}

impl KnowledgeApi {
    /// Record a journal entry as a typed entity. The primary write must
    /// succeed; edges and telemetry are best-effort and reported in `skipped`.
    pub fn journal_write(
        &self,
        session_id: Option<&str>,
        category: &str,
        content: &str,
        domain: Option<&str>,
    ) -> ApiResult<JournalEntry> {
        if category == "friction" {
            // Friction has its own recurrence-tracking path
            let logged = self.friction_log(session_id, content, "conceptual", false)?;
            return Ok(JournalEntry {
                entry_id: logged.friction_id,
                kind: EntityKind::Friction.as_str().to_string(),
                embedded: false,
                skipped: Vec::new(),
            });
        }

        let kind = kind_for_category(category).ok_or_else(|| ApiError::InvalidValue {
            given: category.to_string(),
            allowed: CATEGORIES.join(", "),
        })?;

        let embedding = self.embed_optional(content);
        let embedded = embedding.is_some();

        let mut entity = Entity::new(kind, content).with_embedding(embedding);
        if let Some(domain) = domain {
            entity = entity.with_domain(domain);
        }
        match kind {
            EntityKind::Insight => entity.set_property("confidence", 0.8),
            EntityKind::Question => {
                entity.set_property("raised_at", Utc::now().to_rfc3339());
                entity.set_property("urgency", "normal");
            }
            _ => {}
        }
        self.store.save_entity(&entity)?;

        let mut skipped = Vec::new();
        if let Some(session_id) = session_id {
            let edge = Relationship::new(
                EntityId::from_string(session_id),
                entity.id.clone(),
                RelationshipKind::Produced,
            );
            if let Err(e) = self.store.save_relationship(&edge) {
                skipped.push(format!("PRODUCED: {}", e));
            }
        }
        if let Some(domain) = domain {
            let edge = Relationship::new(
                entity.id.clone(),
                EntityId::from_string(format!("domain-{}", domain)),
                RelationshipKind::OperatesIn,
            );
            if let Err(e) = self.store.ensure_relationship(&edge) {
                skipped.push(format!("OPERATES_IN {}: {}", domain, e));
            }
        }

        self.emit(&knowledge_event(
            session_id.unwrap_or("none"),
            &kind.slug(),
            entity.id.as_str(),
        ));
        info!(kind = %kind, id = %entity.id, "journal entry stored");

        Ok(JournalEntry {
            entry_id: entity.id.to_string(),
            kind: kind.as_str().to_string(),
            embedded,
            skipped,
        })
    }

    /// Semantic search over stored knowledge. Falls back to substring search
    /// when no embedding model is available.
    pub fn journal_query(
        &self,
        query: &str,
        kinds: Option<&[EntityKind]>,
        limit: usize,
    ) -> ApiResult<Vec<JournalHit>> {
        let kinds = kinds.unwrap_or(&DEFAULT_QUERY_KINDS);

        let mut hits: Vec<JournalHit> = match self.embed_optional(query) {
            Some(vector) => {
                let mut scored = Vec::new();
                for kind in kinds {
                    for (entity, score) in self.store.find_similar(*kind, &vector, limit)? {
                        scored.push(hit(&entity, score));
                    }
                }
                scored
            }
            None => {
                let mut found = Vec::new();
                for kind in kinds {
                    for entity in self.store.search_text(*kind, query, limit)? {
                        found.push(hit(&entity, 0.0));
                    }
                }
                found
            }
        };

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }
}

fn hit(entity: &Entity, score: f32) -> JournalHit {
    JournalHit {
        id: entity.id.to_string(),
        kind: entity.kind.as_str().to_string(),
        content: snippet(&entity.content, 300),
        domain: entity.domain.clone(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{api, api_with_embedder};
    use crate::storage::{seed_reference_data, EntityFilter};

    #[test]
    fn write_rejects_unknown_category_before_mutation() {
        let (api, _dir) = api();
        let err = api
            .journal_write(None, "epiphany", "nope", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidValue { .. }));
        let all = api
            .store
            .find_entities(&EntityFilter::new())
            .unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn write_links_session_and_domain() {
        let (api, _dir) = api();
        seed_reference_data(api.store.as_ref()).unwrap();
        let opened = api.session_open("work", None, None, &[]).unwrap();

        let entry = api
            .journal_write(
                Some(&opened.session_id),
                "insight",
                "smaller diffs review faster",
                Some("technical"),
            )
            .unwrap();
        assert!(entry.skipped.is_empty());
        assert!(entry.embedded);

        let edges = api
            .store
            .relationships_from(&EntityId::from_string(&entry.entry_id))
            .unwrap();
        assert!(edges.iter().any(|r| r.kind == RelationshipKind::OperatesIn));
    }

    #[test]
    fn write_with_dead_session_still_stores_entity() {
        let (api, _dir) = api();
        let entry = api
            .journal_write(Some("session-gone"), "observation", "noted", None)
            .unwrap();
        assert_eq!(entry.skipped.len(), 1);
        assert!(api
            .store
            .load_entity(&EntityId::from_string(&entry.entry_id))
            .unwrap()
            .is_some());
    }

    #[test]
    fn question_entries_carry_lifecycle_properties() {
        let (api, _dir) = api();
        let entry = api
            .journal_write(None, "question", "is the cache coherent?", None)
            .unwrap();
        let stored = api
            .store
            .load_entity(&EntityId::from_string(&entry.entry_id))
            .unwrap()
            .unwrap();
        assert_eq!(stored.kind, EntityKind::Question);
        assert!(stored.time_prop("raised_at").is_some());
        assert_eq!(stored.str_prop("urgency"), Some("normal"));
    }

    #[test]
    fn query_ranks_by_similarity() {
        let (api, _dir) = api_with_embedder(vec![1.0, 0.0]);
        let close = Entity::new(EntityKind::Insight, "close match")
            .with_embedding(Some(vec![1.0, 0.0]));
        let far = Entity::new(EntityKind::Insight, "far match")
            .with_embedding(Some(vec![0.0, 1.0]));
        api.store.save_entity(&close).unwrap();
        api.store.save_entity(&far).unwrap();

        let hits = api.journal_query("anything", None, 5).unwrap();
        assert_eq!(hits[0].content, "close match");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn query_falls_back_to_text_search_without_model() {
        let (api, dir) = api();
        let api = KnowledgeApi::new(
            api.store.clone(),
            std::sync::Arc::new(crate::embeddings::DisabledEmbedder),
            std::sync::Arc::new(crate::telemetry::TelemetrySink::new(dir.path()).unwrap()),
        );
        api.store
            .save_entity(&Entity::new(EntityKind::Observation, "retry storms on deploy"))
            .unwrap();

        let hits = api.journal_query("retry storms", None, 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.0);
    }
}
