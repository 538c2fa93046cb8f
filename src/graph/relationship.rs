//! Relationship representation — typed edges between entities
//!
//! The graph uses a single polymorphic edge record carrying a `RelationshipKind`.
//! The per-endpoint-type distinctions (a session producing an insight versus a
//! session producing a friction) are recovered from the endpoint entities
//! themselves rather than materialized as separate edge tables.

use super::entity::{EntityId, Properties, PropertyValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipId(Uuid);

impl RelationshipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Session produced a knowledge entity
    Produced,
    /// Session snapshot of pre-existing knowledge at open (immutable afterwards)
    Inherited,
    /// Observation merged into a synthesized Insight
    MergedInto,
    /// Observation/Reflection/Insight crystallized into higher-order knowledge
    CrystallizedInto,
    /// Friction/Experience/OperationalState is a manifestation of a Pattern
    ManifestationOf,
    /// Causal chain (friction to insight, insight to insight/belief/decision)
    LedTo,
    /// Newer entity evolved from an older one of the same kind
    EvolvedFrom,
    /// Belief contradicts another Belief; `resolution` attribute when reconciled
    Contradicts,
    /// Belief supersedes another Belief
    Supersedes,
    /// Belief refines another Belief
    Refines,
    /// Entity operates in a Domain
    OperatesIn,
    /// Session/Decision serves a Goal
    Serves,
    /// Session worked with a Human
    WorkedWith,
    /// Session activated a Persona
    Activated,
    /// Session followed a Protocol
    Followed,
    /// Session used a Tool; carries a `count` attribute
    Used,
    /// Session/Goal blocked by a Friction
    BlockedBy,
    /// Session experienced an OperationalState
    ExperiencedState,
    /// Question resolved by an Insight or Decision
    ResolvedBy,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Produced => "PRODUCED",
            RelationshipKind::Inherited => "INHERITED",
            RelationshipKind::MergedInto => "MERGED_INTO",
            RelationshipKind::CrystallizedInto => "CRYSTALLIZED_INTO",
            RelationshipKind::ManifestationOf => "MANIFESTATION_OF",
            RelationshipKind::LedTo => "LED_TO",
            RelationshipKind::EvolvedFrom => "EVOLVED_FROM",
            RelationshipKind::Contradicts => "CONTRADICTS",
            RelationshipKind::Supersedes => "SUPERSEDES",
            RelationshipKind::Refines => "REFINES",
            RelationshipKind::OperatesIn => "OPERATES_IN",
            RelationshipKind::Serves => "SERVES",
            RelationshipKind::WorkedWith => "WORKED_WITH",
            RelationshipKind::Activated => "ACTIVATED",
            RelationshipKind::Followed => "FOLLOWED",
            RelationshipKind::Used => "USED",
            RelationshipKind::BlockedBy => "BLOCKED_BY",
            RelationshipKind::ExperiencedState => "EXPERIENCED_STATE",
            RelationshipKind::ResolvedBy => "RESOLVED_BY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        const ALL: [RelationshipKind; 19] = [
            RelationshipKind::Produced,
            RelationshipKind::Inherited,
            RelationshipKind::MergedInto,
            RelationshipKind::CrystallizedInto,
            RelationshipKind::ManifestationOf,
            RelationshipKind::LedTo,
            RelationshipKind::EvolvedFrom,
            RelationshipKind::Contradicts,
            RelationshipKind::Supersedes,
            RelationshipKind::Refines,
            RelationshipKind::OperatesIn,
            RelationshipKind::Serves,
            RelationshipKind::WorkedWith,
            RelationshipKind::Activated,
            RelationshipKind::Followed,
            RelationshipKind::Used,
            RelationshipKind::BlockedBy,
            RelationshipKind::ExperiencedState,
            RelationshipKind::ResolvedBy,
        ];
        ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source: EntityId,
    pub target: EntityId,
    pub kind: RelationshipKind,
    /// When the relationship became valid
    pub valid_from: DateTime<Utc>,
    /// Edge attributes: `contribution`, `confidence`, `resolution`, `severity`,
    /// `role`, `count`, ...
    pub properties: Properties,
}

impl Relationship {
    pub fn new(source: EntityId, target: EntityId, kind: RelationshipKind) -> Self {
        Self {
            id: RelationshipId::new(),
            source,
            target,
            kind,
            valid_from: Utc::now(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn str_prop(&self, key: &str) -> Option<&str> {
        match self.properties.get(key) {
            Some(PropertyValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn int_prop(&self, key: &str) -> Option<i64> {
        match self.properties.get(key) {
            Some(PropertyValue::Int(n)) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for s in ["PRODUCED", "MERGED_INTO", "CONTRADICTS", "LED_TO"] {
            let kind = RelationshipKind::parse(s).unwrap();
            assert_eq!(kind.as_str(), s);
        }
        assert_eq!(RelationshipKind::parse("KNOWS"), None);
    }

    #[test]
    fn relationship_carries_attributes() {
        let rel = Relationship::new(
            EntityId::from_string("belief-a"),
            EntityId::from_string("belief-b"),
            RelationshipKind::Contradicts,
        )
        .with_property("resolution", "belief-a superseded");

        assert_eq!(rel.str_prop("resolution"), Some("belief-a superseded"));
        assert_eq!(rel.kind, RelationshipKind::Contradicts);
    }
}
