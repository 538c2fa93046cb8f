//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

// ── Session params ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionOpenParams {
    #[schemars(description = "What this session sets out to do")]
    pub goal: String,
    #[schemars(description = "Name of the human collaborator (auto-created on first use)")]
    pub human: Option<String>,
    #[schemars(description = "Persona activated for this session")]
    pub persona: Option<String>,
    #[schemars(description = "Protocols followed during this session")]
    pub protocols: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionCloseParams {
    #[schemars(description = "The session ID returned by session_open")]
    pub session_id: String,
    #[schemars(description = "Short summary of what happened")]
    pub summary: Option<String>,
    #[schemars(description = "Suppress the closing reflection prompt")]
    pub skip_reflection: Option<bool>,
}

// ── Journal params ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct JournalWriteParams {
    #[schemars(description = "Session this entry belongs to (optional)")]
    pub session_id: Option<String>,
    #[schemars(
        description = "One of: insight, observation, friction, reflection, experience, decision, question"
    )]
    pub category: String,
    #[schemars(description = "The entry text")]
    pub content: String,
    #[schemars(description = "Domain tag, e.g. 'technical' or 'meta-cognitive'")]
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct JournalQueryParams {
    #[schemars(description = "Free-text query")]
    pub query: String,
    #[schemars(description = "Entity kinds to search (defaults to Insight, Observation, Pattern, Belief)")]
    pub kinds: Option<Vec<String>>,
    #[schemars(description = "Maximum number of results (default 10)")]
    pub limit: Option<usize>,
}

// ── Friction params ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FrictionLogParams {
    #[schemars(description = "Session in which the friction occurred (optional)")]
    pub session_id: Option<String>,
    #[schemars(description = "What went wrong")]
    pub description: String,
    #[schemars(description = "One of: tooling, conceptual, process, environmental, relational")]
    pub category: String,
    #[schemars(description = "Whether this friction is blocking progress right now")]
    pub blocking: Option<bool>,
}

// ── Reflection params ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReflectParams {
    #[schemars(description = "Session this reflection belongs to (optional)")]
    pub session_id: Option<String>,
    #[schemars(description = "The reflection text")]
    pub content: String,
}

// ── Maintenance params ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatternCheckParams {
    #[schemars(description = "Session providing context for generated proposals (optional)")]
    pub session_id: Option<String>,
    #[schemars(description = "Write evolution proposal documents when warranted (default true)")]
    pub generate_proposals: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LibrarianRunParams {
    #[schemars(description = "Which librarian to run: synthesizer, protector, pathfinder, or all (default)")]
    pub which: Option<String>,
}
