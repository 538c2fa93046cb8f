//! Retrieval and pathway mapper
//!
//! Read-only analytics over graph connectivity: embedding coverage, domain
//! histograms, hub nodes, underutilized knowledge, and coarse semantic
//! clusters. This engine never mutates the graph.

use super::StepOutcome;
use crate::graph::{EntityKind, RelationshipKind};
use crate::storage::{EntityFilter, GraphStore};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

pub const HUB_DEGREE_THRESHOLD: usize = 5;
pub const HUB_LIMIT: usize = 20;
pub const UNDERUTILIZED_CAP: usize = 10;
pub const DOMAIN_CLUSTER_MIN: usize = 3;
pub const GOAL_CLUSTER_MIN: usize = 2;

#[derive(Debug, Serialize)]
pub struct MissingEmbeddings {
    pub kind: String,
    pub missing: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct Hub {
    pub id: String,
    pub degree: usize,
}

#[derive(Debug, Serialize)]
pub struct Cluster {
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct PathfinderOutcome {
    /// Kinds whose embedding coverage has gaps
    pub index_gaps: Vec<MissingEmbeddings>,
    /// Domain tag to entity count
    pub domains: BTreeMap<String, usize>,
    /// Entities with more than `HUB_DEGREE_THRESHOLD` relationship endpoints
    pub hubs: Vec<Hub>,
    /// Beliefs never inherited by any session
    pub unused_beliefs: Vec<String>,
    /// Insights with no outgoing causal or crystallization edges
    pub dead_end_insights: Vec<String>,
    pub clusters: Vec<Cluster>,
    pub report: Vec<StepOutcome>,
}

pub fn run(store: &dyn GraphStore) -> PathfinderOutcome {
    let mut outcome = PathfinderOutcome::default();
    index_health(store, &mut outcome);
    map_pathways(store, &mut outcome);
    find_underutilized(store, &mut outcome);
    find_clusters(store, &mut outcome);
    info!(
        gaps = outcome.index_gaps.len(),
        hubs = outcome.hubs.len(),
        clusters = outcome.clusters.len(),
        "pathfinder run finished"
    );
    outcome
}

fn index_health(store: &dyn GraphStore, outcome: &mut PathfinderOutcome) {
    for kind in EntityKind::EMBEDDABLE {
        match store.find_entities(&EntityFilter::new().with_kind(kind)) {
            Ok(entities) => {
                let total = entities.len();
                let missing = entities.iter().filter(|e| e.embedding.is_none()).count();
                if missing > 0 {
                    outcome.index_gaps.push(MissingEmbeddings {
                        kind: kind.as_str().to_string(),
                        missing,
                        total,
                    });
                }
            }
            Err(e) => outcome
                .report
                .push(StepOutcome::skipped(format!("index health {}", kind), e)),
        }
    }
}

fn map_pathways(store: &dyn GraphStore, outcome: &mut PathfinderOutcome) {
    match store.find_entities(&EntityFilter::new()) {
        Ok(entities) => {
            for entity in &entities {
                if let Some(domain) = &entity.domain {
                    *outcome.domains.entry(domain.clone()).or_insert(0) += 1;
                }
            }
        }
        Err(e) => outcome.report.push(StepOutcome::skipped("domain histogram", e)),
    }

    match store.all_relationships() {
        Ok(edges) => {
            let mut degree: HashMap<String, usize> = HashMap::new();
            for edge in &edges {
                *degree.entry(edge.source.to_string()).or_insert(0) += 1;
                *degree.entry(edge.target.to_string()).or_insert(0) += 1;
            }
            let mut hubs: Vec<Hub> = degree
                .into_iter()
                .filter(|(_, d)| *d > HUB_DEGREE_THRESHOLD)
                .map(|(id, degree)| Hub { id, degree })
                .collect();
            hubs.sort_by(|a, b| b.degree.cmp(&a.degree).then(a.id.cmp(&b.id)));
            hubs.truncate(HUB_LIMIT);
            outcome.hubs = hubs;
        }
        Err(e) => outcome.report.push(StepOutcome::skipped("hub detection", e)),
    }
}

fn find_underutilized(store: &dyn GraphStore, outcome: &mut PathfinderOutcome) {
    match store.find_entities(&EntityFilter::new().with_kind(EntityKind::Belief)) {
        Ok(beliefs) => {
            for belief in beliefs {
                if outcome.unused_beliefs.len() >= UNDERUTILIZED_CAP {
                    break;
                }
                match store.relationships_to(&belief.id) {
                    Ok(incoming) => {
                        if incoming.iter().all(|r| r.kind != RelationshipKind::Inherited) {
                            outcome.unused_beliefs.push(belief.id.to_string());
                        }
                    }
                    Err(e) => outcome
                        .report
                        .push(StepOutcome::skipped(format!("belief usage {}", belief.id), e)),
                }
            }
        }
        Err(e) => outcome.report.push(StepOutcome::skipped("unused beliefs", e)),
    }

    match store.find_entities(&EntityFilter::new().with_kind(EntityKind::Insight)) {
        Ok(insights) => {
            for insight in insights {
                if outcome.dead_end_insights.len() >= UNDERUTILIZED_CAP {
                    break;
                }
                match store.relationships_from(&insight.id) {
                    Ok(edges) => {
                        let leads_anywhere = edges.iter().any(|r| {
                            matches!(
                                r.kind,
                                RelationshipKind::LedTo
                                    | RelationshipKind::CrystallizedInto
                                    | RelationshipKind::EvolvedFrom
                            )
                        });
                        if !leads_anywhere {
                            outcome.dead_end_insights.push(insight.id.to_string());
                        }
                    }
                    Err(e) => outcome
                        .report
                        .push(StepOutcome::skipped(format!("insight usage {}", insight.id), e)),
                }
            }
        }
        Err(e) => outcome.report.push(StepOutcome::skipped("dead-end insights", e)),
    }
}

/// Coarse clusters: well-populated domains, and goals several sessions serve.
fn find_clusters(store: &dyn GraphStore, outcome: &mut PathfinderOutcome) {
    for (domain, count) in &outcome.domains {
        if *count > DOMAIN_CLUSTER_MIN {
            outcome.clusters.push(Cluster {
                name: format!("domain:{}", domain),
                size: *count,
            });
        }
    }

    match store.relationships_of_kind(RelationshipKind::Serves) {
        Ok(edges) => {
            let mut sessions_per_goal: HashMap<String, Vec<String>> = HashMap::new();
            for edge in edges {
                let is_session_to_goal = (|| -> crate::storage::StorageResult<bool> {
                    let (Some(source), Some(target)) = (
                        store.load_entity(&edge.source)?,
                        store.load_entity(&edge.target)?,
                    ) else {
                        return Ok(false);
                    };
                    Ok(source.kind == EntityKind::Session && target.kind == EntityKind::Goal)
                })();
                match is_session_to_goal {
                    Ok(true) => sessions_per_goal
                        .entry(edge.target.to_string())
                        .or_default()
                        .push(edge.source.to_string()),
                    Ok(false) => {}
                    Err(e) => outcome
                        .report
                        .push(StepOutcome::skipped("goal cluster", e)),
                }
            }
            for (goal, mut sessions) in sessions_per_goal {
                sessions.sort();
                sessions.dedup();
                if sessions.len() > GOAL_CLUSTER_MIN {
                    outcome.clusters.push(Cluster {
                        name: format!("goal:{}", goal),
                        size: sessions.len(),
                    });
                }
            }
        }
        Err(e) => outcome.report.push(StepOutcome::skipped("goal clusters", e)),
    }

    outcome.clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.name.cmp(&b.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Entity, Relationship};
    use crate::storage::{OpenStore, SqliteStore};

    #[test]
    fn reports_embedding_gaps_per_kind() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save_entity(
                &Entity::new(EntityKind::Insight, "vectorized")
                    .with_embedding(Some(vec![1.0])),
            )
            .unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Insight, "bare"))
            .unwrap();

        let outcome = run(&store);
        let gap = outcome
            .index_gaps
            .iter()
            .find(|g| g.kind == "Insight")
            .unwrap();
        assert_eq!(gap.missing, 1);
        assert_eq!(gap.total, 2);
    }

    #[test]
    fn hubs_require_degree_above_threshold() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hub = Entity::new(EntityKind::Belief, "central belief");
        store.save_entity(&hub).unwrap();
        for n in 0..6 {
            let other = Entity::new(EntityKind::Insight, format!("spoke {}", n));
            store.save_entity(&other).unwrap();
            store
                .save_relationship(&Relationship::new(
                    other.id,
                    hub.id.clone(),
                    RelationshipKind::Refines,
                ))
                .unwrap();
        }

        let outcome = run(&store);
        assert_eq!(outcome.hubs.len(), 1);
        assert_eq!(outcome.hubs[0].id, hub.id.to_string());
        assert_eq!(outcome.hubs[0].degree, 6);
    }

    #[test]
    fn never_inherited_beliefs_are_flagged() {
        let store = SqliteStore::open_in_memory().unwrap();
        let used = Entity::new(EntityKind::Belief, "inherited");
        let unused = Entity::new(EntityKind::Belief, "ignored");
        let session = Entity::new(EntityKind::Session, "work");
        for e in [&used, &unused, &session] {
            store.save_entity(e).unwrap();
        }
        store
            .save_relationship(&Relationship::new(
                session.id,
                used.id.clone(),
                RelationshipKind::Inherited,
            ))
            .unwrap();

        let outcome = run(&store);
        assert_eq!(outcome.unused_beliefs, vec![unused.id.to_string()]);
    }

    #[test]
    fn shared_goals_form_clusters() {
        let store = SqliteStore::open_in_memory().unwrap();
        let goal = Entity::new(EntityKind::Goal, "ship the migration");
        store.save_entity(&goal).unwrap();
        for n in 0..3 {
            let session = Entity::new(EntityKind::Session, format!("attempt {}", n));
            store.save_entity(&session).unwrap();
            store
                .save_relationship(&Relationship::new(
                    session.id,
                    goal.id.clone(),
                    RelationshipKind::Serves,
                ))
                .unwrap();
        }

        let outcome = run(&store);
        let cluster = outcome
            .clusters
            .iter()
            .find(|c| c.name == format!("goal:{}", goal.id))
            .unwrap();
        assert_eq!(cluster.size, 3);
    }

    #[test]
    fn run_is_read_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Insight, "untouched").with_domain("technical"))
            .unwrap();
        let before = store.find_entities(&EntityFilter::new()).unwrap().len();

        run(&store);

        let after = store.find_entities(&EntityFilter::new()).unwrap().len();
        assert_eq!(before, after);
        assert!(store.all_relationships().unwrap().is_empty());
    }
}
