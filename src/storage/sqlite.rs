//! SQLite storage backend
//!
//! Single database file with one table for entities and one polymorphic table
//! for relationships. Thread-safe via internal mutex on the connection. All
//! queries use bound parameters; nothing is spliced into SQL text.

use super::traits::{EntityFilter, GraphStore, OpenStore, StorageError, StorageResult};
use crate::embeddings::cosine_similarity;
use crate::graph::{
    Entity, EntityId, EntityKind, PropertyValue, Relationship, RelationshipId, RelationshipKind,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Raw entity row: (id, kind, content, domain, created_at, embedding_json, properties_json)
type EntityRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    String,
);

/// Raw relationship row: (id, source_id, target_id, kind, valid_from, properties_json)
type RelRow = (String, String, String, String, String, String);

const ENTITY_COLUMNS: &str = "id, kind, content, domain, created_at, embedding_json, properties_json";
const REL_COLUMNS: &str = "id, source_id, target_id, kind, valid_from, properties_json";

/// SQLite-backed graph store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Fixed-width UTC timestamp for lexicographically ordered TEXT comparison.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

/// Escape `%` and `_` for a LIKE pattern with `ESCAPE '\'`.
fn like_escape(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl SqliteStore {
    /// Initialize the database schema. Idempotent: every statement uses
    /// IF NOT EXISTS, so re-running against an existing database is a no-op.
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                content TEXT NOT NULL,
                domain TEXT,
                created_at TEXT NOT NULL,
                embedding_json TEXT,
                properties_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entities_kind
                ON entities(kind);
            CREATE INDEX IF NOT EXISTS idx_entities_domain
                ON entities(domain);
            CREATE INDEX IF NOT EXISTS idx_entities_created
                ON entities(kind, created_at);

            CREATE TABLE IF NOT EXISTS relationships (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                valid_from TEXT NOT NULL,
                properties_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rel_source
                ON relationships(source_id);
            CREATE INDEX IF NOT EXISTS idx_rel_target
                ON relationships(target_id);
            CREATE INDEX IF NOT EXISTS idx_rel_kind
                ON relationships(kind);

            -- WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn entity_from_row(row: EntityRow) -> StorageResult<Entity> {
        let (id, kind_str, content, domain, created_at, embedding_json, properties_json) = row;
        let kind = EntityKind::parse(&kind_str)
            .ok_or_else(|| StorageError::UnknownKind(kind_str.clone()))?;
        let embedding = match embedding_json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        Ok(Entity {
            id: EntityId::from_string(id),
            kind,
            content,
            domain,
            created_at: parse_ts(&created_at)?,
            embedding,
            properties: serde_json::from_str(&properties_json)?,
        })
    }

    fn rel_from_row(row: RelRow) -> StorageResult<Relationship> {
        let (id, source_id, target_id, kind_str, valid_from, properties_json) = row;
        let kind = RelationshipKind::parse(&kind_str)
            .ok_or_else(|| StorageError::UnknownRelationship(kind_str.clone()))?;
        Ok(Relationship {
            id: RelationshipId::parse(&id)
                .ok_or_else(|| StorageError::DateParse(format!("bad relationship id: {}", id)))?,
            source: EntityId::from_string(source_id),
            target: EntityId::from_string(target_id),
            kind,
            valid_from: parse_ts(&valid_from)?,
            properties: serde_json::from_str(&properties_json)?,
        })
    }

    fn query_relationships(&self, sql: &str, param: Option<&str>) -> StorageResult<Vec<Relationship>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RelRow> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        };
        let rows: Vec<RelRow> = match param {
            Some(p) => stmt
                .query_map(params![p], map)?
                .collect::<rusqlite::Result<_>>()?,
            None => stmt.query_map([], map)?.collect::<rusqlite::Result<_>>()?,
        };
        rows.into_iter().map(Self::rel_from_row).collect()
    }

    fn entity_exists(conn: &Connection, id: &EntityId) -> StorageResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM entities WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl GraphStore for SqliteStore {
    fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
        let embedding_json = entity
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let properties_json = serde_json::to_string(&entity.properties)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO entities (id, kind, content, domain, created_at, embedding_json, properties_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entity.id.as_str(),
                entity.kind.as_str(),
                entity.content,
                entity.domain,
                ts(&entity.created_at),
                embedding_json,
                properties_json,
            ],
        )?;
        Ok(())
    }

    fn load_entity(&self, id: &EntityId) -> StorageResult<Option<Entity>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<EntityRow> = conn
            .query_row(
                &format!("SELECT {} FROM entities WHERE id = ?1", ENTITY_COLUMNS),
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .optional()?;
        drop(conn);
        row.map(Self::entity_from_row).transpose()
    }

    fn delete_entity(&self, id: &EntityId) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM relationships WHERE source_id = ?1 OR target_id = ?1",
            params![id.as_str()],
        )?;
        let deleted = tx.execute("DELETE FROM entities WHERE id = ?1", params![id.as_str()])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn set_property(&self, id: &EntityId, key: &str, value: PropertyValue) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let json: Option<String> = conn
            .query_row(
                "SELECT properties_json FROM entities WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(json) = json else {
            return Ok(false);
        };
        let mut properties: crate::graph::Properties = serde_json::from_str(&json)?;
        properties.insert(key.to_string(), value);
        conn.execute(
            "UPDATE entities SET properties_json = ?1 WHERE id = ?2",
            params![serde_json::to_string(&properties)?, id.as_str()],
        )?;
        Ok(true)
    }

    fn find_entities(&self, filter: &EntityFilter) -> StorageResult<Vec<Entity>> {
        let mut sql = format!("SELECT {} FROM entities", ENTITY_COLUMNS);
        let mut clauses: Vec<&str> = Vec::new();
        let mut bind: Vec<String> = Vec::new();

        if let Some(kind) = filter.kind {
            clauses.push("kind = ?");
            bind.push(kind.as_str().to_string());
        }
        if let Some(domain) = &filter.domain {
            clauses.push("domain = ?");
            bind.push(domain.clone());
        }
        if let Some(content) = &filter.content {
            clauses.push("content = ?");
            bind.push(content.clone());
        }
        if let Some(cutoff) = &filter.created_before {
            clauses.push("created_at < ?");
            bind.push(ts(cutoff));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<EntityRow> = stmt
            .query_map(rusqlite::params_from_iter(bind.iter()), |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;
        drop(stmt);
        drop(conn);
        rows.into_iter().map(Self::entity_from_row).collect()
    }

    fn save_relationship(&self, rel: &Relationship) -> StorageResult<()> {
        let properties_json = serde_json::to_string(&rel.properties)?;
        let conn = self.conn.lock().unwrap();
        if !Self::entity_exists(&conn, &rel.source)? {
            return Err(StorageError::EntityNotFound(rel.source.to_string()));
        }
        if !Self::entity_exists(&conn, &rel.target)? {
            return Err(StorageError::EntityNotFound(rel.target.to_string()));
        }
        conn.execute(
            "INSERT INTO relationships (id, source_id, target_id, kind, valid_from, properties_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                rel.id.to_string(),
                rel.source.as_str(),
                rel.target.as_str(),
                rel.kind.as_str(),
                ts(&rel.valid_from),
                properties_json,
            ],
        )?;
        Ok(())
    }

    fn ensure_relationship(&self, rel: &Relationship) -> StorageResult<bool> {
        {
            let conn = self.conn.lock().unwrap();
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM relationships WHERE source_id = ?1 AND target_id = ?2 AND kind = ?3",
                    params![rel.source.as_str(), rel.target.as_str(), rel.kind.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(false);
            }
        }
        self.save_relationship(rel)?;
        Ok(true)
    }

    fn relationships_from(&self, id: &EntityId) -> StorageResult<Vec<Relationship>> {
        self.query_relationships(
            &format!("SELECT {} FROM relationships WHERE source_id = ?1", REL_COLUMNS),
            Some(id.as_str()),
        )
    }

    fn relationships_to(&self, id: &EntityId) -> StorageResult<Vec<Relationship>> {
        self.query_relationships(
            &format!("SELECT {} FROM relationships WHERE target_id = ?1", REL_COLUMNS),
            Some(id.as_str()),
        )
    }

    fn relationships_of_kind(&self, kind: RelationshipKind) -> StorageResult<Vec<Relationship>> {
        self.query_relationships(
            &format!("SELECT {} FROM relationships WHERE kind = ?1", REL_COLUMNS),
            Some(kind.as_str()),
        )
    }

    fn all_relationships(&self) -> StorageResult<Vec<Relationship>> {
        self.query_relationships(&format!("SELECT {} FROM relationships", REL_COLUMNS), None)
    }

    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM relationships WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    fn merge_entities(&self, keep: &EntityId, remove: &EntityId) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for id in [keep, remove] {
            let found: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM entities WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if found.is_none() {
                return Err(StorageError::EntityNotFound(id.to_string()));
            }
        }

        tx.execute(
            "UPDATE relationships SET source_id = ?1 WHERE source_id = ?2",
            params![keep.as_str(), remove.as_str()],
        )?;
        tx.execute(
            "UPDATE relationships SET target_id = ?1 WHERE target_id = ?2",
            params![keep.as_str(), remove.as_str()],
        )?;
        tx.execute("DELETE FROM entities WHERE id = ?1", params![remove.as_str()])?;

        tx.commit()?;
        Ok(())
    }

    fn find_similar(
        &self,
        kind: EntityKind,
        query: &[f32],
        limit: usize,
    ) -> StorageResult<Vec<(Entity, f32)>> {
        let candidates = self.find_entities(&EntityFilter::new().with_kind(kind))?;
        let mut scored: Vec<(Entity, f32)> = candidates
            .into_iter()
            .filter_map(|entity| {
                let score = entity
                    .embedding
                    .as_ref()
                    .map(|vec| cosine_similarity(query, vec))?;
                Some((entity, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    fn search_text(&self, kind: EntityKind, needle: &str, limit: usize) -> StorageResult<Vec<Entity>> {
        let pattern = format!("%{}%", like_escape(needle));
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM entities WHERE kind = ?1 AND content LIKE ?2 ESCAPE '\\'
             ORDER BY created_at DESC LIMIT ?3",
            ENTITY_COLUMNS
        ))?;
        let rows: Vec<EntityRow> = stmt
            .query_map(params![kind.as_str(), pattern, limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;
        drop(stmt);
        drop(conn);
        rows.into_iter().map(Self::entity_from_row).collect()
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Entity;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn belief(id: &str, content: &str) -> Entity {
        Entity::new(EntityKind::Belief, content).with_id(EntityId::from_string(id))
    }

    #[test]
    fn entity_round_trip() {
        let store = store();
        let entity = Entity::new(EntityKind::Insight, "tests clarify intent")
            .with_domain("technical")
            .with_embedding(Some(vec![0.1, 0.2, 0.3]))
            .with_property("confidence", 0.8);
        store.save_entity(&entity).unwrap();

        let loaded = store.load_entity(&entity.id).unwrap().unwrap();
        assert_eq!(loaded.kind, EntityKind::Insight);
        assert_eq!(loaded.content, "tests clarify intent");
        assert_eq!(loaded.domain.as_deref(), Some("technical"));
        assert_eq!(loaded.embedding, Some(vec![0.1, 0.2, 0.3]));
        assert_eq!(loaded.float_prop("confidence"), Some(0.8));
    }

    #[test]
    fn load_missing_entity_is_none() {
        let store = store();
        let got = store
            .load_entity(&EntityId::from_string("nothing-here"))
            .unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn find_entities_filters_by_kind_and_content() {
        let store = store();
        store.save_entity(&belief("belief-a", "tests first")).unwrap();
        store.save_entity(&belief("belief-b", "tests first")).unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Insight, "tests first"))
            .unwrap();

        let beliefs = store
            .find_entities(&EntityFilter::new().with_kind(EntityKind::Belief))
            .unwrap();
        assert_eq!(beliefs.len(), 2);

        let same_content = store
            .find_entities(
                &EntityFilter::new()
                    .with_kind(EntityKind::Belief)
                    .with_content("tests first"),
            )
            .unwrap();
        assert_eq!(same_content.len(), 2);
    }

    #[test]
    fn created_before_filter_uses_cutoff() {
        let store = store();
        let mut old = Entity::new(EntityKind::Observation, "old one");
        old.created_at = Utc::now() - chrono::Duration::days(10);
        store.save_entity(&old).unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Observation, "fresh one"))
            .unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(7);
        let stale = store
            .find_entities(
                &EntityFilter::new()
                    .with_kind(EntityKind::Observation)
                    .created_before(cutoff),
            )
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].content, "old one");
    }

    #[test]
    fn relationship_requires_both_endpoints() {
        let store = store();
        store.save_entity(&belief("belief-a", "a")).unwrap();
        let rel = Relationship::new(
            EntityId::from_string("belief-a"),
            EntityId::from_string("belief-missing"),
            RelationshipKind::Contradicts,
        );
        let err = store.save_relationship(&rel).unwrap_err();
        assert!(matches!(err, StorageError::EntityNotFound(_)));
    }

    #[test]
    fn ensure_relationship_is_idempotent() {
        let store = store();
        store.save_entity(&belief("belief-a", "a")).unwrap();
        store.save_entity(&belief("belief-b", "b")).unwrap();

        let rel = Relationship::new(
            EntityId::from_string("belief-a"),
            EntityId::from_string("belief-b"),
            RelationshipKind::Refines,
        );
        assert!(store.ensure_relationship(&rel).unwrap());
        let again = Relationship::new(
            EntityId::from_string("belief-a"),
            EntityId::from_string("belief-b"),
            RelationshipKind::Refines,
        );
        assert!(!store.ensure_relationship(&again).unwrap());
        assert_eq!(store.all_relationships().unwrap().len(), 1);
    }

    #[test]
    fn detach_delete_removes_edges() {
        let store = store();
        store.save_entity(&belief("belief-a", "a")).unwrap();
        store.save_entity(&belief("belief-b", "b")).unwrap();
        store
            .save_relationship(&Relationship::new(
                EntityId::from_string("belief-a"),
                EntityId::from_string("belief-b"),
                RelationshipKind::Supersedes,
            ))
            .unwrap();

        assert!(store.delete_entity(&EntityId::from_string("belief-b")).unwrap());
        assert!(store
            .load_entity(&EntityId::from_string("belief-b"))
            .unwrap()
            .is_none());
        assert!(store.all_relationships().unwrap().is_empty());
    }

    #[test]
    fn merge_preserves_edges_from_both_entities() {
        let store = store();
        store.save_entity(&belief("belief-a", "dup")).unwrap();
        store.save_entity(&belief("belief-b", "dup")).unwrap();
        store.save_entity(&belief("belief-x", "x")).unwrap();
        store.save_entity(&belief("belief-y", "y")).unwrap();

        store
            .save_relationship(&Relationship::new(
                EntityId::from_string("belief-a"),
                EntityId::from_string("belief-x"),
                RelationshipKind::Refines,
            ))
            .unwrap();
        store
            .save_relationship(&Relationship::new(
                EntityId::from_string("belief-b"),
                EntityId::from_string("belief-y"),
                RelationshipKind::Refines,
            ))
            .unwrap();

        store
            .merge_entities(
                &EntityId::from_string("belief-a"),
                &EntityId::from_string("belief-b"),
            )
            .unwrap();

        assert!(store
            .load_entity(&EntityId::from_string("belief-b"))
            .unwrap()
            .is_none());
        let from_a = store
            .relationships_from(&EntityId::from_string("belief-a"))
            .unwrap();
        let targets: Vec<&str> = from_a.iter().map(|r| r.target.as_str()).collect();
        assert!(targets.contains(&"belief-x"));
        assert!(targets.contains(&"belief-y"));
    }

    #[test]
    fn merge_with_missing_entity_fails_without_side_effects() {
        let store = store();
        store.save_entity(&belief("belief-a", "a")).unwrap();
        let err = store
            .merge_entities(
                &EntityId::from_string("belief-a"),
                &EntityId::from_string("belief-gone"),
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::EntityNotFound(_)));
        assert!(store
            .load_entity(&EntityId::from_string("belief-a"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn find_similar_ranks_by_cosine() {
        let store = store();
        store
            .save_entity(
                &Entity::new(EntityKind::Insight, "close")
                    .with_id(EntityId::from_string("insight-close"))
                    .with_embedding(Some(vec![1.0, 0.0, 0.0])),
            )
            .unwrap();
        store
            .save_entity(
                &Entity::new(EntityKind::Insight, "far")
                    .with_id(EntityId::from_string("insight-far"))
                    .with_embedding(Some(vec![0.0, 1.0, 0.0])),
            )
            .unwrap();
        store
            .save_entity(
                &Entity::new(EntityKind::Insight, "no vector")
                    .with_id(EntityId::from_string("insight-none")),
            )
            .unwrap();

        let hits = store
            .find_similar(EntityKind::Insight, &[1.0, 0.0, 0.0], 10)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id.as_str(), "insight-close");
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn search_text_matches_substring_case_insensitively() {
        let store = store();
        store
            .save_entity(&Entity::new(EntityKind::Friction, "Docker build keeps timing out"))
            .unwrap();
        store
            .save_entity(&Entity::new(EntityKind::Friction, "unrelated annoyance"))
            .unwrap();

        let hits = store
            .search_text(EntityKind::Friction, "docker build", 5)
            .unwrap();
        assert_eq!(hits.len(), 1);

        // LIKE wildcards in the needle must not act as wildcards
        let none = store.search_text(EntityKind::Friction, "%", 5).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn set_property_updates_in_place() {
        let store = store();
        let friction = Entity::new(EntityKind::Friction, "slow CI")
            .with_property("recurrence_count", 1i64);
        store.save_entity(&friction).unwrap();

        assert!(store
            .set_property(&friction.id, "recurrence_count", PropertyValue::Int(2))
            .unwrap());
        let loaded = store.load_entity(&friction.id).unwrap().unwrap();
        assert_eq!(loaded.int_prop("recurrence_count"), Some(2));

        assert!(!store
            .set_property(
                &EntityId::from_string("missing"),
                "recurrence_count",
                PropertyValue::Int(2)
            )
            .unwrap());
    }
}
