//! Session lifecycle: open with an inherited snapshot, close with a summary

use super::{ApiError, ApiResult, KnowledgeApi};
use crate::graph::{Entity, EntityId, EntityKind, Relationship, RelationshipKind};
use crate::storage::EntityFilter;
use crate::telemetry::{session_end_event, session_start_event};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct SessionOpened {
    pub session_id: String,
    pub goal: String,
    /// Inherited snapshot, entity count per kind
    pub inherited: BTreeMap<String, usize>,
    /// Steps that could not be applied, with reasons
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionClosed {
    pub session_id: String,
    pub duration_seconds: i64,
    pub insights_produced: usize,
    pub frictions_produced: usize,
    pub tool_calls: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_prompt: Option<String>,
}

impl KnowledgeApi {
    /// Open a session. The INHERITED edges written here are a snapshot of the
    /// knowledge that existed at this moment; they are never updated later.
    pub fn session_open(
        &self,
        goal: &str,
        human: Option<&str>,
        persona: Option<&str>,
        protocols: &[String],
    ) -> ApiResult<SessionOpened> {
        let session = Entity::new(EntityKind::Session, goal)
            .with_property("started_at", Utc::now().to_rfc3339())
            .with_property("archived", false);
        self.store.save_entity(&session)?;

        let mut inherited = BTreeMap::new();
        let mut skipped = Vec::new();

        for kind in EntityKind::INHERITABLE {
            let entities = match self
                .store
                .find_entities(&EntityFilter::new().with_kind(kind))
            {
                Ok(entities) => entities,
                Err(e) => {
                    skipped.push(format!("inherit {}: {}", kind, e));
                    continue;
                }
            };
            let mut count = 0;
            for entity in &entities {
                let edge = Relationship::new(
                    session.id.clone(),
                    entity.id.clone(),
                    RelationshipKind::Inherited,
                );
                match self.store.ensure_relationship(&edge) {
                    Ok(_) => count += 1,
                    Err(e) => skipped.push(format!("inherit {}: {}", entity.id, e)),
                }
            }
            if count > 0 {
                inherited.insert(kind.as_str().to_string(), count);
            }
        }

        if let Some(name) = human {
            self.link_participant(
                &session.id,
                EntityKind::Human,
                name,
                RelationshipKind::WorkedWith,
                &mut skipped,
            );
        }
        if let Some(name) = persona {
            self.link_participant(
                &session.id,
                EntityKind::Persona,
                name,
                RelationshipKind::Activated,
                &mut skipped,
            );
        }
        for name in protocols {
            self.link_participant(
                &session.id,
                EntityKind::Protocol,
                name,
                RelationshipKind::Followed,
                &mut skipped,
            );
        }

        self.emit(&session_start_event(session.id.as_str(), goal));
        info!(session = %session.id, "session opened");

        Ok(SessionOpened {
            session_id: session.id.to_string(),
            goal: goal.to_string(),
            inherited,
            skipped,
        })
    }

    /// Close a session: record end time, duration, and what it produced.
    pub fn session_close(
        &self,
        session_id: &str,
        summary: Option<&str>,
        skip_reflection: bool,
    ) -> ApiResult<SessionClosed> {
        let id = EntityId::from_string(session_id);
        let session = self
            .store
            .load_entity(&id)?
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;

        let ended = Utc::now();
        let started = session.time_prop("started_at").unwrap_or(session.created_at);
        let duration_seconds = (ended - started).num_seconds().max(0);

        self.store
            .set_property(&id, "ended_at", ended.to_rfc3339().into())?;
        self.store
            .set_property(&id, "duration_seconds", duration_seconds.into())?;
        if let Some(summary) = summary {
            self.store.set_property(&id, "summary", summary.into())?;
        }

        let mut insights_produced = 0;
        let mut frictions_produced = 0;
        let mut tool_calls: i64 = 0;
        for edge in self.store.relationships_from(&id)? {
            match edge.kind {
                RelationshipKind::Produced => {
                    if let Some(target) = self.store.load_entity(&edge.target)? {
                        match target.kind {
                            EntityKind::Insight => insights_produced += 1,
                            EntityKind::Friction => frictions_produced += 1,
                            _ => {}
                        }
                    }
                }
                RelationshipKind::Used => {
                    tool_calls += edge.int_prop("count").unwrap_or(1);
                }
                _ => {}
            }
        }

        let reflection_prompt = if skip_reflection {
            None
        } else {
            Some(format!(
                "Session ran {}s and produced {} insight(s), {} friction(s). \
                 What stood out? Call reflect with anything worth keeping.",
                duration_seconds, insights_produced, frictions_produced
            ))
        };

        self.emit(&session_end_event(
            session_id,
            duration_seconds,
            insights_produced,
            frictions_produced,
        ));
        info!(session = %session_id, duration_seconds, "session closed");

        Ok(SessionClosed {
            session_id: session_id.to_string(),
            duration_seconds,
            insights_produced,
            frictions_produced,
            tool_calls,
            reflection_prompt,
        })
    }

    /// Find or create a named participant entity and link the session to it.
    fn link_participant(
        &self,
        session: &EntityId,
        kind: EntityKind,
        name: &str,
        edge_kind: RelationshipKind,
        skipped: &mut Vec<String>,
    ) {
        let result = (|| -> ApiResult<()> {
            let existing = self.store.find_entities(
                &EntityFilter::new().with_kind(kind).with_content(name),
            )?;
            let target = match existing.into_iter().next() {
                Some(entity) => entity.id,
                None => {
                    let entity = Entity::new(kind, name).with_property("name", name);
                    self.store.save_entity(&entity)?;
                    entity.id
                }
            };
            self.store.ensure_relationship(&Relationship::new(
                session.clone(),
                target,
                edge_kind,
            ))?;
            Ok(())
        })();
        if let Err(e) = result {
            skipped.push(format!("{} {}: {}", edge_kind, name, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::api;
    use crate::graph::Entity;

    #[test]
    fn open_snapshots_existing_knowledge_only() {
        let (api, _dir) = api();
        let b1 = Entity::new(EntityKind::Belief, "belief one");
        api.store.save_entity(&b1).unwrap();

        let s1 = api.session_open("first", None, None, &[]).unwrap();
        assert_eq!(s1.inherited.get("Belief"), Some(&1));

        let b2 = Entity::new(EntityKind::Belief, "belief two");
        api.store.save_entity(&b2).unwrap();

        let s2 = api.session_open("second", None, None, &[]).unwrap();
        assert_eq!(s2.inherited.get("Belief"), Some(&2));

        // S1's snapshot is unchanged by B2's arrival
        let s1_inherited: Vec<_> = api
            .store
            .relationships_from(&EntityId::from_string(&s1.session_id))
            .unwrap()
            .into_iter()
            .filter(|r| r.kind == RelationshipKind::Inherited)
            .collect();
        assert_eq!(s1_inherited.len(), 1);
        assert_eq!(s1_inherited[0].target, b1.id);
    }

    #[test]
    fn open_links_participants_and_creates_them_on_first_use() {
        let (api, _dir) = api();
        let opened = api
            .session_open("pairing", Some("sam"), Some("navigator"), &["tdd".to_string()])
            .unwrap();
        assert!(opened.skipped.is_empty());

        let edges = api
            .store
            .relationships_from(&EntityId::from_string(&opened.session_id))
            .unwrap();
        let kinds: Vec<_> = edges.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&RelationshipKind::WorkedWith));
        assert!(kinds.contains(&RelationshipKind::Activated));
        assert!(kinds.contains(&RelationshipKind::Followed));

        // Second session reuses the same Human entity
        api.session_open("again", Some("sam"), None, &[]).unwrap();
        let humans = api
            .store
            .find_entities(&EntityFilter::new().with_kind(EntityKind::Human))
            .unwrap();
        assert_eq!(humans.len(), 1);
    }

    #[test]
    fn close_unknown_session_is_a_structured_failure() {
        let (api, _dir) = api();
        let err = api.session_close("session-nope", None, true).unwrap_err();
        assert!(matches!(err, ApiError::SessionNotFound(_)));
    }

    #[test]
    fn close_counts_produced_entities() {
        let (api, _dir) = api();
        let opened = api.session_open("work", None, None, &[]).unwrap();
        let session_id = EntityId::from_string(&opened.session_id);

        let insight = Entity::new(EntityKind::Insight, "learned a thing");
        api.store.save_entity(&insight).unwrap();
        api.store
            .save_relationship(&Relationship::new(
                session_id.clone(),
                insight.id,
                RelationshipKind::Produced,
            ))
            .unwrap();

        let closed = api
            .session_close(&opened.session_id, Some("done"), false)
            .unwrap();
        assert_eq!(closed.insights_produced, 1);
        assert_eq!(closed.frictions_produced, 0);
        assert!(closed.reflection_prompt.is_some());

        let stored = api.store.load_entity(&session_id).unwrap().unwrap();
        assert_eq!(stored.str_prop("summary"), Some("done"));
        assert!(stored.time_prop("ended_at").is_some());
    }
}
