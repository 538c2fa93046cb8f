//! Telemetry event shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single structured event, one JSON object per line on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    /// Correlates every event of one session
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    pub attributes: Map<String, Value>,
}

impl TelemetryEvent {
    pub fn new(event_type: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type: event_type.into(),
            trace_id: trace_id.into(),
            span_id: None,
            attributes: Map::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

fn trace_for_session(session_id: &str) -> String {
    format!("sess-{}", session_id)
}

/// Event for a knowledge entity written during a session.
pub fn knowledge_event(session_id: &str, kind_slug: &str, entity_id: &str) -> TelemetryEvent {
    TelemetryEvent::new(
        format!("knowledge.{}", kind_slug),
        trace_for_session(session_id),
    )
    .with_attr("mnema.session.id", session_id)
    .with_attr(format!("mnema.{}.id", kind_slug), entity_id)
}

pub fn session_start_event(session_id: &str, goal: &str) -> TelemetryEvent {
    TelemetryEvent::new("session.start", trace_for_session(session_id))
        .with_attr("mnema.session.id", session_id)
        .with_attr("mnema.session.goal", goal)
}

pub fn session_end_event(
    session_id: &str,
    duration_seconds: i64,
    insights: usize,
    frictions: usize,
) -> TelemetryEvent {
    TelemetryEvent::new("session.end", trace_for_session(session_id))
        .with_attr("mnema.session.id", session_id)
        .with_attr("mnema.session.duration_seconds", duration_seconds)
        .with_attr("mnema.session.insights", insights)
        .with_attr("mnema.session.frictions", frictions)
}

pub fn reflection_event(session_id: &str, reflection_id: &str, insights: usize) -> TelemetryEvent {
    TelemetryEvent::new("reflection.triggered", trace_for_session(session_id))
        .with_attr("mnema.session.id", session_id)
        .with_attr("mnema.reflection.id", reflection_id)
        .with_attr("mnema.reflection.insights", insights)
}
