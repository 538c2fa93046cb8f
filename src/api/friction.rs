//! Friction logging with recurrence tracking

use super::{ApiError, ApiResult, KnowledgeApi, FRICTION_CATEGORIES};
use crate::graph::{Entity, EntityId, EntityKind, Relationship, RelationshipKind};
use crate::telemetry::knowledge_event;
use serde::Serialize;
use tracing::info;

/// Prefix length used to match a new description against stored frictions.
const MATCH_PREFIX_CHARS: usize = 50;

#[derive(Debug, Serialize)]
pub struct FrictionLogged {
    pub friction_id: String,
    pub is_recurring: bool,
    pub recurrence_count: i64,
    pub skipped: Vec<String>,
}

impl KnowledgeApi {
    /// Log a friction point. A description that substring-matches an existing
    /// friction increments that entity's recurrence counter and returns the
    /// same id; the counter never decreases.
    pub fn friction_log(
        &self,
        session_id: Option<&str>,
        description: &str,
        category: &str,
        blocking: bool,
    ) -> ApiResult<FrictionLogged> {
        if !FRICTION_CATEGORIES.contains(&category) {
            return Err(ApiError::InvalidValue {
                given: category.to_string(),
                allowed: FRICTION_CATEGORIES.join(", "),
            });
        }

        let needle: String = description.chars().take(MATCH_PREFIX_CHARS).collect();
        let existing = self
            .store
            .search_text(EntityKind::Friction, &needle, 1)?
            .into_iter()
            .next();

        let mut skipped = Vec::new();
        let (friction_id, is_recurring, recurrence_count) = match existing {
            Some(friction) => {
                let count = friction.int_prop("recurrence_count").unwrap_or(1) + 1;
                self.store
                    .set_property(&friction.id, "recurrence_count", count.into())?;
                info!(friction = %friction.id, count, "friction recurred");
                (friction.id, true, count)
            }
            None => {
                let entity = Entity::new(EntityKind::Friction, description)
                    .with_embedding(self.embed_optional(description))
                    .with_property("category", category)
                    .with_property("recurrence_count", 1i64);
                self.store.save_entity(&entity)?;
                info!(friction = %entity.id, category, "friction logged");
                (entity.id, false, 1)
            }
        };

        if let Some(session_id) = session_id {
            let session = EntityId::from_string(session_id);
            let produced =
                Relationship::new(session.clone(), friction_id.clone(), RelationshipKind::Produced);
            if let Err(e) = self.store.ensure_relationship(&produced) {
                skipped.push(format!("PRODUCED: {}", e));
            }
            if blocking {
                let blocked = Relationship::new(session, friction_id.clone(), RelationshipKind::BlockedBy)
                    .with_property("severity", "blocking");
                if let Err(e) = self.store.ensure_relationship(&blocked) {
                    skipped.push(format!("BLOCKED_BY: {}", e));
                }
            }
        }

        self.emit(&knowledge_event(
            session_id.unwrap_or("none"),
            "friction",
            friction_id.as_str(),
        ));

        Ok(FrictionLogged {
            friction_id: friction_id.to_string(),
            is_recurring,
            recurrence_count,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::api;

    #[test]
    fn invalid_category_is_rejected_with_allowed_set() {
        let (api, _dir) = api();
        let err = api
            .friction_log(None, "broken", "cosmic", false)
            .unwrap_err();
        match err {
            ApiError::InvalidValue { given, allowed } => {
                assert_eq!(given, "cosmic");
                assert!(allowed.contains("tooling"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn recurrence_is_monotonic_and_keeps_one_entity() {
        let (api, _dir) = api();
        let description = "cargo fetch hangs behind the proxy";

        let first = api
            .friction_log(None, description, "tooling", false)
            .unwrap();
        assert!(!first.is_recurring);
        assert_eq!(first.recurrence_count, 1);

        for n in 2..=4 {
            let again = api
                .friction_log(None, description, "tooling", false)
                .unwrap();
            assert_eq!(again.friction_id, first.friction_id);
            assert!(again.is_recurring);
            assert_eq!(again.recurrence_count, n);
        }
    }

    #[test]
    fn blocking_friction_links_back_to_session() {
        let (api, _dir) = api();
        let opened = api.session_open("debug", None, None, &[]).unwrap();
        let logged = api
            .friction_log(Some(&opened.session_id), "db locked", "environmental", true)
            .unwrap();
        assert!(logged.skipped.is_empty());

        let edges = api
            .store
            .relationships_from(&EntityId::from_string(&opened.session_id))
            .unwrap();
        let blocked: Vec<_> = edges
            .iter()
            .filter(|r| r.kind == RelationshipKind::BlockedBy)
            .collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].str_prop("severity"), Some("blocking"));
    }
}
