//! Integrity and lifecycle engine
//!
//! Structural and temporal hygiene: dedupe identical knowledge, age out stale
//! questions, archive old sessions, report orphans, prune observations that
//! never crystallized. Each item is its own unit of atomicity; one failure
//! degrades to a skipped step and the run continues.

use super::StepOutcome;
use crate::graph::{snippet, EntityKind, RelationshipKind};
use crate::storage::{EntityFilter, GraphStore};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

pub const QUESTION_STALE_DAYS: i64 = 30;
pub const SESSION_ARCHIVE_DAYS: i64 = 90;
pub const OBSERVATION_MAX_AGE_DAYS: i64 = 60;
/// Hard-delete cap per run, bounding the blast radius of one pass.
pub const PRUNE_CAP: usize = 50;
pub const ORPHAN_CAP_PER_KIND: usize = 10;

const DEDUPE_KINDS: [EntityKind; 2] = [EntityKind::Belief, EntityKind::Insight];
const ORPHAN_KINDS: [EntityKind; 5] = [
    EntityKind::Insight,
    EntityKind::Observation,
    EntityKind::Pattern,
    EntityKind::Belief,
    EntityKind::Friction,
];

#[derive(Debug, Default, Serialize)]
pub struct ProtectionOutcome {
    pub duplicates_merged: usize,
    pub questions_abandoned: usize,
    pub sessions_archived: usize,
    /// Advisory only; orphans are never auto-removed
    pub orphans: Vec<String>,
    pub observations_pruned: usize,
    pub report: Vec<StepOutcome>,
}

pub fn run(store: &dyn GraphStore) -> ProtectionOutcome {
    let mut outcome = ProtectionOutcome::default();
    deduplicate(store, &mut outcome);
    mark_stale_questions(store, &mut outcome);
    archive_old_sessions(store, &mut outcome);
    detect_orphans(store, &mut outcome);
    prune_observations(store, &mut outcome);
    info!(
        merged = outcome.duplicates_merged,
        abandoned = outcome.questions_abandoned,
        archived = outcome.sessions_archived,
        pruned = outcome.observations_pruned,
        "protection run finished"
    );
    outcome
}

/// Same kind, byte-identical content, different ids: keep the
/// lexicographically smallest id and redirect everything else onto it.
fn deduplicate(store: &dyn GraphStore, outcome: &mut ProtectionOutcome) {
    for kind in DEDUPE_KINDS {
        let entities = match store.find_entities(&EntityFilter::new().with_kind(kind)) {
            Ok(list) => list,
            Err(e) => {
                outcome
                    .report
                    .push(StepOutcome::skipped(format!("dedupe {}", kind), e));
                continue;
            }
        };

        let mut by_content: HashMap<&str, Vec<&crate::graph::Entity>> = HashMap::new();
        for entity in &entities {
            by_content.entry(entity.content.as_str()).or_default().push(entity);
        }

        for group in by_content.values_mut() {
            if group.len() < 2 {
                continue;
            }
            group.sort_by(|a, b| a.id.cmp(&b.id));
            let keep = &group[0].id;
            for duplicate in &group[1..] {
                match store.merge_entities(keep, &duplicate.id) {
                    Ok(()) => {
                        outcome.duplicates_merged += 1;
                        outcome.report.push(StepOutcome::applied(format!(
                            "merged {} into {}",
                            duplicate.id, keep
                        )));
                    }
                    Err(e) => outcome
                        .report
                        .push(StepOutcome::skipped(format!("merge {}", duplicate.id), e)),
                }
            }
        }
    }
}

/// Unresolved questions past the staleness window get `urgency = abandoned`.
/// Already-abandoned questions are left alone, so re-running changes nothing.
fn mark_stale_questions(store: &dyn GraphStore, outcome: &mut ProtectionOutcome) {
    let cutoff = Utc::now() - Duration::days(QUESTION_STALE_DAYS);
    let questions = match store.find_entities(&EntityFilter::new().with_kind(EntityKind::Question))
    {
        Ok(list) => list,
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("stale questions", e));
            return;
        }
    };

    for question in questions {
        if question.time_prop("resolved_at").is_some() {
            continue;
        }
        if question.str_prop("urgency") == Some("abandoned") {
            continue;
        }
        let raised = question.time_prop("raised_at").unwrap_or(question.created_at);
        if raised >= cutoff {
            continue;
        }
        match store.set_property(&question.id, "urgency", "abandoned".into()) {
            Ok(_) => {
                outcome.questions_abandoned += 1;
                outcome
                    .report
                    .push(StepOutcome::applied(format!("abandoned {}", question.id)));
            }
            Err(e) => outcome
                .report
                .push(StepOutcome::skipped(format!("abandon {}", question.id), e)),
        }
    }
}

/// Soft-delete marker only; nothing is moved or removed.
fn archive_old_sessions(store: &dyn GraphStore, outcome: &mut ProtectionOutcome) {
    let cutoff = Utc::now() - Duration::days(SESSION_ARCHIVE_DAYS);
    let sessions = match store.find_entities(&EntityFilter::new().with_kind(EntityKind::Session)) {
        Ok(list) => list,
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("archive sessions", e));
            return;
        }
    };

    for session in sessions {
        if session.bool_prop("archived") == Some(true) {
            continue;
        }
        let Some(ended) = session.time_prop("ended_at") else {
            continue;
        };
        if ended >= cutoff {
            continue;
        }
        match store.set_property(&session.id, "archived", true.into()) {
            Ok(_) => {
                outcome.sessions_archived += 1;
                outcome
                    .report
                    .push(StepOutcome::applied(format!("archived {}", session.id)));
            }
            Err(e) => outcome
                .report
                .push(StepOutcome::skipped(format!("archive {}", session.id), e)),
        }
    }
}

fn detect_orphans(store: &dyn GraphStore, outcome: &mut ProtectionOutcome) {
    for kind in ORPHAN_KINDS {
        let entities = match store.find_entities(&EntityFilter::new().with_kind(kind)) {
            Ok(list) => list,
            Err(e) => {
                outcome
                    .report
                    .push(StepOutcome::skipped(format!("orphans {}", kind), e));
                continue;
            }
        };
        let mut found = 0;
        for entity in entities {
            if found >= ORPHAN_CAP_PER_KIND {
                break;
            }
            let connected = (|| -> crate::storage::StorageResult<bool> {
                Ok(!store.relationships_from(&entity.id)?.is_empty()
                    || !store.relationships_to(&entity.id)?.is_empty())
            })();
            match connected {
                Ok(true) => {}
                Ok(false) => {
                    found += 1;
                    outcome
                        .orphans
                        .push(format!("{} {}: {}", kind, entity.id, snippet(&entity.content, 50)));
                }
                Err(e) => outcome
                    .report
                    .push(StepOutcome::skipped(format!("orphan check {}", entity.id), e)),
            }
        }
    }
}

/// Hard-delete aged observations that were never merged or crystallized.
/// Observations carrying a MERGED_INTO or CRYSTALLIZED_INTO edge are the
/// synthesizer's lineage and stay.
fn prune_observations(store: &dyn GraphStore, outcome: &mut ProtectionOutcome) {
    let cutoff = Utc::now() - Duration::days(OBSERVATION_MAX_AGE_DAYS);
    let observations = match store.find_entities(
        &EntityFilter::new()
            .with_kind(EntityKind::Observation)
            .created_before(cutoff),
    ) {
        Ok(list) => list,
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("prune", e));
            return;
        }
    };

    for observation in observations {
        if outcome.observations_pruned >= PRUNE_CAP {
            break;
        }
        let result = (|| -> crate::storage::StorageResult<bool> {
            let merged = store.relationships_from(&observation.id)?.iter().any(|r| {
                matches!(
                    r.kind,
                    RelationshipKind::MergedInto | RelationshipKind::CrystallizedInto
                )
            });
            if merged {
                return Ok(false);
            }
            store.delete_entity(&observation.id)
        })();
        match result {
            Ok(true) => {
                outcome.observations_pruned += 1;
                outcome
                    .report
                    .push(StepOutcome::applied(format!("pruned {}", observation.id)));
            }
            Ok(false) => {}
            Err(e) => outcome
                .report
                .push(StepOutcome::skipped(format!("prune {}", observation.id), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Entity, EntityId, Relationship};
    use crate::storage::{OpenStore, SqliteStore};

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn aged<E: Into<i64>>(mut entity: Entity, days: E) -> Entity {
        entity.created_at = Utc::now() - Duration::days(days.into());
        entity
    }

    #[test]
    fn duplicate_beliefs_merge_keeping_smallest_id() {
        let store = store();
        let a = Entity::new(EntityKind::Belief, "tests first")
            .with_id(EntityId::from_string("belief-aaa"));
        let b = Entity::new(EntityKind::Belief, "tests first")
            .with_id(EntityId::from_string("belief-bbb"));
        let x = Entity::new(EntityKind::Insight, "x");
        store.save_entity(&a).unwrap();
        store.save_entity(&b).unwrap();
        store.save_entity(&x).unwrap();
        store
            .save_relationship(&Relationship::new(
                b.id.clone(),
                x.id.clone(),
                RelationshipKind::LedTo,
            ))
            .unwrap();

        let outcome = run(&store);
        assert_eq!(outcome.duplicates_merged, 1);
        assert!(store.load_entity(&b.id).unwrap().is_none());

        // b's edge now hangs off a
        let edges = store.relationships_from(&a.id).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, x.id);
    }

    #[test]
    fn stale_question_marking_is_idempotent() {
        let store = store();
        store
            .save_entity(&aged(
                Entity::new(EntityKind::Question, "why is this slow?")
                    .with_property("urgency", "normal"),
                QUESTION_STALE_DAYS + 1,
            ))
            .unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Question, "fresh question"))
            .unwrap();

        let first = run(&store);
        assert_eq!(first.questions_abandoned, 1);

        let second = run(&store);
        assert_eq!(second.questions_abandoned, 0);
    }

    #[test]
    fn resolved_questions_are_never_abandoned() {
        let store = store();
        store
            .save_entity(&aged(
                Entity::new(EntityKind::Question, "answered long ago")
                    .with_property("resolved_at", Utc::now().to_rfc3339()),
                QUESTION_STALE_DAYS + 10,
            ))
            .unwrap();

        let outcome = run(&store);
        assert_eq!(outcome.questions_abandoned, 0);
    }

    #[test]
    fn old_ended_sessions_are_archived_once() {
        let store = store();
        let old_end = (Utc::now() - Duration::days(SESSION_ARCHIVE_DAYS + 1)).to_rfc3339();
        store
            .save_entity(
                &Entity::new(EntityKind::Session, "ancient work")
                    .with_property("ended_at", old_end)
                    .with_property("archived", false),
            )
            .unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Session, "still open"))
            .unwrap();

        let first = run(&store);
        assert_eq!(first.sessions_archived, 1);

        let second = run(&store);
        assert_eq!(second.sessions_archived, 0);
    }

    #[test]
    fn orphans_are_reported_not_deleted() {
        let store = store();
        let orphan = Entity::new(EntityKind::Pattern, "nobody references this")
            .with_property("occurrence_count", 0i64);
        store.save_entity(&orphan).unwrap();

        let outcome = run(&store);
        assert_eq!(outcome.orphans.len(), 1);
        assert!(outcome.orphans[0].contains("nobody references"));
        assert!(store.load_entity(&orphan.id).unwrap().is_some());
    }

    #[test]
    fn pruning_respects_the_per_run_cap() {
        let store = store();
        for n in 0..75 {
            store
                .save_entity(&aged(
                    Entity::new(EntityKind::Observation, format!("stale {}", n)),
                    OBSERVATION_MAX_AGE_DAYS + 1,
                ))
                .unwrap();
        }

        let first = run(&store);
        assert_eq!(first.observations_pruned, PRUNE_CAP);
        let left = store
            .find_entities(&EntityFilter::new().with_kind(EntityKind::Observation))
            .unwrap();
        assert_eq!(left.len(), 25);

        let second = run(&store);
        assert_eq!(second.observations_pruned, 25);
    }

    #[test]
    fn merged_observations_are_protected_from_pruning() {
        let store = store();
        let merged = aged(
            Entity::new(EntityKind::Observation, "merged long ago"),
            OBSERVATION_MAX_AGE_DAYS + 1,
        );
        let insight = Entity::new(EntityKind::Insight, "the result");
        store.save_entity(&merged).unwrap();
        store.save_entity(&insight).unwrap();
        store
            .save_relationship(&Relationship::new(
                merged.id.clone(),
                insight.id,
                RelationshipKind::MergedInto,
            ))
            .unwrap();

        let outcome = run(&store);
        assert_eq!(outcome.observations_pruned, 0);
        assert!(store.load_entity(&merged.id).unwrap().is_some());
    }

    #[test]
    fn failed_dedupe_query_degrades_to_skipped_step() {
        let store = crate::librarian::test_support::FailingKindStore::new(EntityKind::Belief);
        store
            .save_entity(&aged(
                Entity::new(EntityKind::Question, "why is this slow?"),
                QUESTION_STALE_DAYS + 1,
            ))
            .unwrap();

        // The Belief dedupe pass fails, the rest of the run still applies
        let outcome = run(&store);
        assert!(outcome.report.iter().any(|s| matches!(
            s,
            StepOutcome::Skipped { step, .. } if step == "dedupe Belief"
        )));
        assert_eq!(outcome.duplicates_merged, 0);
        assert_eq!(outcome.questions_abandoned, 1);
    }
}
