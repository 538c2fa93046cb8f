//! Entity representation in the self-knowledge graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a knowledge entity.
///
/// Ids are human-readable strings (e.g. `friction-20260830-141502-ab12cd34`),
/// assigned once at creation and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh id with the given prefix (typically the entity kind slug).
    pub fn generate(prefix: &str) -> Self {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        Self(format!("{}-{}-{}", prefix, stamp, short_hex()))
    }

    /// Wrap an existing id string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First 8 hex chars of a fresh v4 UUID.
pub fn short_hex() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// The entity kinds the graph schema declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Session,
    Observation,
    Insight,
    Pattern,
    Belief,
    Friction,
    Question,
    Reflection,
    Decision,
    Experience,
    Domain,
    Tool,
    OperationalState,
    Human,
    Persona,
    Protocol,
    Sutra,
    Goal,
    Capability,
    Limitation,
}

impl EntityKind {
    /// Every declared kind.
    pub const ALL: [EntityKind; 20] = [
        EntityKind::Session,
        EntityKind::Observation,
        EntityKind::Insight,
        EntityKind::Pattern,
        EntityKind::Belief,
        EntityKind::Friction,
        EntityKind::Question,
        EntityKind::Reflection,
        EntityKind::Decision,
        EntityKind::Experience,
        EntityKind::Domain,
        EntityKind::Tool,
        EntityKind::OperationalState,
        EntityKind::Human,
        EntityKind::Persona,
        EntityKind::Protocol,
        EntityKind::Sutra,
        EntityKind::Goal,
        EntityKind::Capability,
        EntityKind::Limitation,
    ];

    /// Kinds expected to carry an embedding vector.
    pub const EMBEDDABLE: [EntityKind; 14] = [
        EntityKind::Insight,
        EntityKind::Observation,
        EntityKind::Pattern,
        EntityKind::Belief,
        EntityKind::Decision,
        EntityKind::Experience,
        EntityKind::Friction,
        EntityKind::Question,
        EntityKind::Sutra,
        EntityKind::Goal,
        EntityKind::Capability,
        EntityKind::Limitation,
        EntityKind::Protocol,
        EntityKind::Reflection,
    ];

    /// Kinds snapshotted into a session's inherited knowledge at open.
    pub const INHERITABLE: [EntityKind; 7] = [
        EntityKind::Belief,
        EntityKind::Insight,
        EntityKind::Pattern,
        EntityKind::Sutra,
        EntityKind::Protocol,
        EntityKind::Limitation,
        EntityKind::Capability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Session => "Session",
            EntityKind::Observation => "Observation",
            EntityKind::Insight => "Insight",
            EntityKind::Pattern => "Pattern",
            EntityKind::Belief => "Belief",
            EntityKind::Friction => "Friction",
            EntityKind::Question => "Question",
            EntityKind::Reflection => "Reflection",
            EntityKind::Decision => "Decision",
            EntityKind::Experience => "Experience",
            EntityKind::Domain => "Domain",
            EntityKind::Tool => "Tool",
            EntityKind::OperationalState => "OperationalState",
            EntityKind::Human => "Human",
            EntityKind::Persona => "Persona",
            EntityKind::Protocol => "Protocol",
            EntityKind::Sutra => "Sutra",
            EntityKind::Goal => "Goal",
            EntityKind::Capability => "Capability",
            EntityKind::Limitation => "Limitation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        EntityKind::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Lowercase prefix used when generating ids for this kind.
    pub fn slug(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Float(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// Properties collection
pub type Properties = HashMap<String, PropertyValue>;

/// A typed node in the self-knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, immutable once assigned
    pub id: EntityId,
    /// Entity kind
    pub kind: EntityKind,
    /// Primary free-text content (description for Friction/Pattern, goal for Session)
    pub content: String,
    /// Optional domain classification
    pub domain: Option<String>,
    /// When the entity was created
    pub created_at: DateTime<Utc>,
    /// Optional embedding vector (fixed dimensionality per model configuration)
    pub embedding: Option<Vec<f32>>,
    /// Kind-specific properties
    pub properties: Properties,
}

impl Entity {
    /// Create a new entity with a generated id.
    pub fn new(kind: EntityKind, content: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(&kind.slug()),
            kind,
            content: content.into(),
            domain: None,
            created_at: Utc::now(),
            embedding: None,
            properties: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Option<Vec<f32>>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
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
            Some(PropertyValue::Float(f)) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn float_prop(&self, key: &str) -> Option<f64> {
        match self.properties.get(key) {
            Some(PropertyValue::Float(f)) => Some(*f),
            Some(PropertyValue::Int(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn bool_prop(&self, key: &str) -> Option<bool> {
        match self.properties.get(key) {
            Some(PropertyValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Parse an RFC 3339 timestamp property.
    pub fn time_prop(&self, key: &str) -> Option<DateTime<Utc>> {
        self.str_prop(key)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_are_unique() {
        let a = EntityId::generate("insight");
        let b = EntityId::generate("insight");
        assert!(a.as_str().starts_with("insight-"));
        assert_ne!(a, b);
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("Widget"), None);
    }

    #[test]
    fn typed_property_accessors() {
        let e = Entity::new(EntityKind::Friction, "flaky test runner")
            .with_property("category", "tooling")
            .with_property("recurrence_count", 3i64)
            .with_property("confidence", 0.7)
            .with_property("archived", false);

        assert_eq!(e.str_prop("category"), Some("tooling"));
        assert_eq!(e.int_prop("recurrence_count"), Some(3));
        assert_eq!(e.float_prop("confidence"), Some(0.7));
        assert_eq!(e.bool_prop("archived"), Some(false));
        assert_eq!(e.str_prop("missing"), None);
    }

    #[test]
    fn time_prop_parses_rfc3339() {
        let now = Utc::now();
        let e = Entity::new(EntityKind::Question, "why?")
            .with_property("resolved_at", now.to_rfc3339());
        let parsed = e.time_prop("resolved_at").unwrap();
        assert_eq!(parsed.timestamp(), now.timestamp());
    }
}
