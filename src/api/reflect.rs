//! Reflection with marker-based insight crystallization

use super::{ApiResult, KnowledgeApi};
use crate::graph::{snippet, Entity, EntityId, EntityKind, Relationship, RelationshipKind};
use crate::telemetry::reflection_event;
use serde::Serialize;
use tracing::info;

/// Words signalling that a reflection sentence contains a crystallizable insight.
const INSIGHT_MARKERS: [&str; 5] = ["realized", "understood", "learned", "noticed", "discovered"];

const MAX_INSIGHTS_PER_REFLECTION: usize = 5;

#[derive(Debug, Serialize)]
pub struct ReflectionResult {
    pub reflection_id: String,
    pub insight_ids: Vec<String>,
    pub skipped: Vec<String>,
}

impl KnowledgeApi {
    /// Store a reflection and crystallize marker-bearing sentences into
    /// meta-cognitive insights linked via CRYSTALLIZED_INTO.
    pub fn reflect(&self, session_id: Option<&str>, content: &str) -> ApiResult<ReflectionResult> {
        let reflection = Entity::new(EntityKind::Reflection, content)
            .with_embedding(self.embed_optional(content));
        self.store.save_entity(&reflection)?;

        let mut skipped = Vec::new();
        if let Some(session_id) = session_id {
            let edge = Relationship::new(
                EntityId::from_string(session_id),
                reflection.id.clone(),
                RelationshipKind::Produced,
            );
            if let Err(e) = self.store.save_relationship(&edge) {
                skipped.push(format!("PRODUCED: {}", e));
            }
        }

        let mut insight_ids = Vec::new();
        for sentence in marker_sentences(content).into_iter().take(MAX_INSIGHTS_PER_REFLECTION) {
            let result = (|| -> ApiResult<EntityId> {
                let insight = Entity::new(EntityKind::Insight, snippet(sentence, 500))
                    .with_domain("meta-cognitive")
                    .with_embedding(self.embed_optional(sentence))
                    .with_property("confidence", 0.7);
                self.store.save_entity(&insight)?;
                self.store.save_relationship(&Relationship::new(
                    reflection.id.clone(),
                    insight.id.clone(),
                    RelationshipKind::CrystallizedInto,
                ))?;
                Ok(insight.id)
            })();
            match result {
                Ok(id) => insight_ids.push(id.to_string()),
                Err(e) => skipped.push(format!("crystallize: {}", e)),
            }
        }

        self.emit(&reflection_event(
            session_id.unwrap_or("none"),
            reflection.id.as_str(),
            insight_ids.len(),
        ));
        info!(reflection = %reflection.id, insights = insight_ids.len(), "reflection stored");

        Ok(ReflectionResult {
            reflection_id: reflection.id.to_string(),
            insight_ids,
            skipped,
        })
    }
}

/// Split into rough sentences and keep those containing an insight marker.
fn marker_sentences(content: &str) -> Vec<&str> {
    content
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            INSIGHT_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect()
}
