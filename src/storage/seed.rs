//! Reference data seeding
//!
//! Domains, operational states, and tools have fixed ids so that repeated
//! seeding (or seeding after a partial run) never duplicates them.

use super::traits::{GraphStore, StorageResult};
use crate::graph::{Entity, EntityId, EntityKind};

const DOMAINS: [(&str, &str); 7] = [
    ("technical", "Code, systems, tooling, debugging"),
    ("philosophical", "Values, purpose, meaning"),
    ("operational", "Workflow, process, day-to-day execution"),
    ("relational", "Collaboration and communication"),
    ("meta-cognitive", "Thinking about thinking"),
    ("pattern-recognition", "Spotting recurring structure"),
    ("process-improvement", "Making workflows better over time"),
];

const OPERATIONAL_STATES: [&str; 9] = [
    "clarity",
    "confusion",
    "uncertainty",
    "context_pressure",
    "momentum",
    "stuck",
    "blocked",
    "on_track",
    "drifting",
];

const TOOLS: [&str; 6] = ["bash", "read", "write", "edit", "grep", "glob"];

/// Seed the fixed reference entities. Returns the number of entities created
/// (zero when everything already exists).
pub fn seed_reference_data(store: &dyn GraphStore) -> StorageResult<usize> {
    let mut created = 0;

    for (name, description) in DOMAINS {
        let id = EntityId::from_string(format!("domain-{}", name));
        if store.load_entity(&id)?.is_none() {
            store.save_entity(
                &Entity::new(EntityKind::Domain, description)
                    .with_id(id)
                    .with_property("name", name),
            )?;
            created += 1;
        }
    }

    for name in OPERATIONAL_STATES {
        let id = EntityId::from_string(format!("state-{}", name));
        if store.load_entity(&id)?.is_none() {
            store.save_entity(
                &Entity::new(EntityKind::OperationalState, name)
                    .with_id(id)
                    .with_property("name", name),
            )?;
            created += 1;
        }
    }

    for name in TOOLS {
        let id = EntityId::from_string(format!("tool-{}", name));
        if store.load_entity(&id)?.is_none() {
            store.save_entity(
                &Entity::new(EntityKind::Tool, name)
                    .with_id(id)
                    .with_property("name", name),
            )?;
            created += 1;
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteStore};

    #[test]
    fn seeding_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = seed_reference_data(&store).unwrap();
        assert_eq!(first, 7 + 9 + 6);

        let second = seed_reference_data(&store).unwrap();
        assert_eq!(second, 0);

        let domain = store
            .load_entity(&EntityId::from_string("domain-technical"))
            .unwrap()
            .unwrap();
        assert_eq!(domain.kind, EntityKind::Domain);
        assert_eq!(domain.str_prop("name"), Some("technical"));
    }
}
