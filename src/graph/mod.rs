//! Domain model: typed entities and relationships

mod entity;
mod relationship;

pub use entity::{short_hex, Entity, EntityId, EntityKind, Properties, PropertyValue};
pub use relationship::{Relationship, RelationshipId, RelationshipKind};

/// Truncate text to at most `max_chars` characters, appending `...` when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
