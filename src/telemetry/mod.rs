//! Structured event telemetry, written as JSONL alongside the database

mod events;
mod sink;

pub use events::{
    knowledge_event, reflection_event, session_end_event, session_start_event, TelemetryEvent,
};
pub use sink::{TelemetryError, TelemetrySink};
