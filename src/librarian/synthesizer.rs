//! Consolidation engine
//!
//! Turns raw accumulated data into higher-order knowledge: merges groups of
//! similar aged observations into insights, promotes recurring friction into
//! emerging patterns, and surfaces cross-domain connections between insights.
//! Every write is best-effort per item; failures degrade to skipped steps.

use super::StepOutcome;
use crate::embeddings::{cosine_similarity, Embedder};
use crate::graph::{snippet, Entity, EntityId, EntityKind, Relationship, RelationshipKind};
use crate::storage::{EntityFilter, GraphStore};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

pub const SIMILARITY_THRESHOLD: f32 = 0.85;
pub const OBSERVATION_AGE_DAYS: i64 = 7;
pub const MIN_OBSERVATIONS_FOR_INSIGHT: usize = 2;
pub const CROSS_DOMAIN_THRESHOLD: f32 = 0.8;
pub const CROSS_DOMAIN_CAP: usize = 10;

const MERGE_CONFIDENCE: f64 = 0.7;
const MERGE_CONTENT_PARTS: usize = 3;

#[derive(Debug, Default, Serialize)]
pub struct SynthesisOutcome {
    pub consolidated_observations: usize,
    pub insights_created: usize,
    pub patterns_detected: usize,
    pub cross_domain_connections: usize,
    pub report: Vec<StepOutcome>,
}

pub fn run(store: &dyn GraphStore, embedder: &dyn Embedder) -> SynthesisOutcome {
    let mut outcome = SynthesisOutcome::default();
    consolidate_observations(store, embedder, &mut outcome);
    promote_friction_patterns(store, embedder, &mut outcome);
    surface_cross_domain(store, &mut outcome);
    info!(
        insights = outcome.insights_created,
        patterns = outcome.patterns_detected,
        connections = outcome.cross_domain_connections,
        "synthesis run finished"
    );
    outcome
}

/// Greedy single-pass clustering: the first unclaimed observation seeds a
/// group, and every later unclaimed observation within threshold of that SEED
/// joins it. No transitive merging across seeds; chain-similar observations
/// (A~B, B~C, A!~C) group by seed proximity only.
fn consolidate_observations(
    store: &dyn GraphStore,
    embedder: &dyn Embedder,
    outcome: &mut SynthesisOutcome,
) {
    let cutoff = Utc::now() - Duration::days(OBSERVATION_AGE_DAYS);
    let observations = match store.find_entities(
        &EntityFilter::new()
            .with_kind(EntityKind::Observation)
            .created_before(cutoff),
    ) {
        Ok(list) => list,
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("consolidate", e));
            return;
        }
    };

    // Only unmerged observations with embeddings participate
    let mut candidates = Vec::new();
    for obs in observations {
        if obs.embedding.is_none() {
            continue;
        }
        match store.relationships_from(&obs.id) {
            Ok(edges) => {
                if edges.iter().all(|r| r.kind != RelationshipKind::MergedInto) {
                    candidates.push(obs);
                }
            }
            Err(e) => outcome
                .report
                .push(StepOutcome::skipped(format!("consolidate {}", obs.id), e)),
        }
    }

    let mut claimed = vec![false; candidates.len()];
    for seed_idx in 0..candidates.len() {
        if claimed[seed_idx] {
            continue;
        }
        let Some(seed_vec) = candidates[seed_idx].embedding.as_ref() else {
            continue;
        };
        let mut group = vec![seed_idx];
        for other_idx in seed_idx + 1..candidates.len() {
            if claimed[other_idx] {
                continue;
            }
            let Some(other_vec) = candidates[other_idx].embedding.as_ref() else {
                continue;
            };
            if cosine_similarity(seed_vec, other_vec) >= SIMILARITY_THRESHOLD {
                group.push(other_idx);
            }
        }
        if group.len() < MIN_OBSERVATIONS_FOR_INSIGHT {
            continue;
        }
        for &idx in &group {
            claimed[idx] = true;
        }

        let members: Vec<&Entity> = group.iter().map(|&i| &candidates[i]).collect();
        match merge_group(store, embedder, &members) {
            Ok(insight_id) => {
                outcome.consolidated_observations += members.len();
                outcome.insights_created += 1;
                outcome.report.push(StepOutcome::applied(format!(
                    "merged {} observations into {}",
                    members.len(),
                    insight_id
                )));
            }
            Err(e) => outcome.report.push(StepOutcome::skipped("merge group", e)),
        }
    }
}

fn merge_group(
    store: &dyn GraphStore,
    embedder: &dyn Embedder,
    members: &[&Entity],
) -> crate::storage::StorageResult<EntityId> {
    let mut parts: Vec<String> = members
        .iter()
        .take(MERGE_CONTENT_PARTS)
        .map(|m| snippet(&m.content, 150))
        .collect();
    if members.len() > MERGE_CONTENT_PARTS {
        parts.push(format!("(+{} more)", members.len() - MERGE_CONTENT_PARTS));
    }
    let combined = parts.join(" | ");

    let domain = members[0].domain.clone().unwrap_or_else(|| "general".to_string());
    let insight = Entity::new(EntityKind::Insight, &combined)
        .with_id(EntityId::from_string(format!(
            "insight-synthesized-{}",
            crate::graph::short_hex()
        )))
        .with_domain(domain)
        .with_embedding(embedder.embed(&combined).ok())
        .with_property("confidence", MERGE_CONFIDENCE);
    store.save_entity(&insight)?;

    // Originals are kept; deletion is lifecycle work, not synthesis
    for member in members {
        store.ensure_relationship(&Relationship::new(
            member.id.clone(),
            insight.id.clone(),
            RelationshipKind::MergedInto,
        ))?;
    }
    Ok(insight.id)
}

/// Any friction recurring three or more times without a pattern-membership
/// edge spawns an emerging Pattern.
fn promote_friction_patterns(
    store: &dyn GraphStore,
    embedder: &dyn Embedder,
    outcome: &mut SynthesisOutcome,
) {
    let frictions = match store.find_entities(&EntityFilter::new().with_kind(EntityKind::Friction))
    {
        Ok(list) => list,
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("promote friction", e));
            return;
        }
    };

    for friction in frictions {
        let count = friction.int_prop("recurrence_count").unwrap_or(1);
        if count < super::significance::FRICTION_RECURRENCE_THRESHOLD {
            continue;
        }
        let result = (|| -> crate::storage::StorageResult<Option<EntityId>> {
            let already = store
                .relationships_from(&friction.id)?
                .iter()
                .any(|r| r.kind == RelationshipKind::ManifestationOf);
            if already {
                return Ok(None);
            }
            let category = friction.str_prop("category").unwrap_or("uncategorized");
            let pattern = Entity::new(EntityKind::Pattern, &friction.content)
                .with_id(EntityId::from_string(format!(
                    "pattern-from-friction-{}",
                    crate::graph::short_hex()
                )))
                .with_embedding(embedder.embed(&friction.content).ok())
                .with_property("name", format!("Recurring {} friction", category))
                .with_property("status", "emerging")
                .with_property("occurrence_count", count);
            store.save_entity(&pattern)?;
            store.ensure_relationship(&Relationship::new(
                friction.id.clone(),
                pattern.id.clone(),
                RelationshipKind::ManifestationOf,
            ))?;
            Ok(Some(pattern.id))
        })();
        match result {
            Ok(Some(pattern_id)) => {
                outcome.patterns_detected += 1;
                outcome.report.push(StepOutcome::applied(format!(
                    "promoted {} to {}",
                    friction.id, pattern_id
                )));
            }
            Ok(None) => {}
            Err(e) => outcome
                .report
                .push(StepOutcome::skipped(format!("promote {}", friction.id), e)),
        }
    }
}

/// Link semantically close insights across different domains. Conservative on
/// purpose: high threshold and a small per-run cap keep the edge count sane.
fn surface_cross_domain(store: &dyn GraphStore, outcome: &mut SynthesisOutcome) {
    let insights = match store.find_entities(&EntityFilter::new().with_kind(EntityKind::Insight)) {
        Ok(list) => list,
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("cross-domain", e));
            return;
        }
    };
    let existing: HashSet<(String, String)> = match store
        .relationships_of_kind(RelationshipKind::LedTo)
    {
        Ok(edges) => edges
            .into_iter()
            .map(|r| (r.source.to_string(), r.target.to_string()))
            .collect(),
        Err(e) => {
            outcome.report.push(StepOutcome::skipped("cross-domain", e));
            return;
        }
    };

    let mut created = 0;
    'outer: for (i, a) in insights.iter().enumerate() {
        let (Some(vec_a), Some(dom_a)) = (a.embedding.as_ref(), a.domain.as_ref()) else {
            continue;
        };
        for b in insights.iter().skip(i + 1) {
            let (Some(vec_b), Some(dom_b)) = (b.embedding.as_ref(), b.domain.as_ref()) else {
                continue;
            };
            if dom_a == dom_b {
                continue;
            }
            let pair = (a.id.to_string(), b.id.to_string());
            let reverse = (b.id.to_string(), a.id.to_string());
            if existing.contains(&pair) || existing.contains(&reverse) {
                continue;
            }
            if cosine_similarity(vec_a, vec_b) < CROSS_DOMAIN_THRESHOLD {
                continue;
            }
            let edge = Relationship::new(a.id.clone(), b.id.clone(), RelationshipKind::LedTo)
                .with_property("contribution", "contextual");
            match store.ensure_relationship(&edge) {
                Ok(_) => {
                    created += 1;
                    outcome
                        .report
                        .push(StepOutcome::applied(format!("linked {} -> {}", a.id, b.id)));
                }
                Err(e) => outcome
                    .report
                    .push(StepOutcome::skipped(format!("link {} -> {}", a.id, b.id), e)),
            }
            if created >= CROSS_DOMAIN_CAP {
                break 'outer;
            }
        }
    }
    outcome.cross_domain_connections = created;
}
