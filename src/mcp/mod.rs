//! MCP server for mnema — exposes the self-knowledge graph via the Model
//! Context Protocol.
//!
//! Tools: 6 knowledge-write + 2 maintenance = 8 total.

pub mod params;

use crate::api::KnowledgeApi;
use crate::embeddings::{DisabledEmbedder, Embedder};
use crate::graph::EntityKind;
use crate::librarian::{DirProposalStore, Librarians};
use crate::storage::{seed_reference_data, OpenStore, SqliteStore};
use crate::telemetry::TelemetrySink;
use params::*;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn ok_json<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ok_text(text),
        Err(e) => err_text(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// MnemaMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MnemaMcpServer {
    api: Arc<KnowledgeApi>,
    librarians: Arc<Librarians>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MnemaMcpServer {
    pub fn new(api: Arc<KnowledgeApi>, librarians: Arc<Librarians>) -> Self {
        Self {
            api,
            librarians,
            tool_router: Self::tool_router(),
        }
    }

    // ── Session tools ───────────────────────────────────────────────────

    #[tool(description = "Open a session: records the goal and snapshots currently-held knowledge")]
    fn session_open(
        &self,
        Parameters(p): Parameters<SessionOpenParams>,
    ) -> Result<CallToolResult, McpError> {
        let protocols = p.protocols.unwrap_or_default();
        match self.api.session_open(
            &p.goal,
            p.human.as_deref(),
            p.persona.as_deref(),
            &protocols,
        ) {
            Ok(opened) => ok_json(&opened),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Close a session: records duration, summary, and what it produced")]
    fn session_close(
        &self,
        Parameters(p): Parameters<SessionCloseParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.session_close(
            &p.session_id,
            p.summary.as_deref(),
            p.skip_reflection.unwrap_or(false),
        ) {
            Ok(closed) => ok_json(&closed),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Journal tools ───────────────────────────────────────────────────

    #[tool(description = "Record a journal entry (insight, observation, friction, reflection, experience, decision, or question)")]
    fn journal_write(
        &self,
        Parameters(p): Parameters<JournalWriteParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.journal_write(
            p.session_id.as_deref(),
            &p.category,
            &p.content,
            p.domain.as_deref(),
        ) {
            Ok(entry) => ok_json(&entry),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Search stored knowledge semantically (falls back to text search without an embedding model)")]
    fn journal_query(
        &self,
        Parameters(p): Parameters<JournalQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        let kinds = match p.kinds {
            Some(names) => {
                let mut parsed = Vec::new();
                for name in &names {
                    match EntityKind::parse(name) {
                        Some(kind) => parsed.push(kind),
                        None => return err_text(format!("unknown entity kind: {}", name)),
                    }
                }
                Some(parsed)
            }
            None => None,
        };
        match self
            .api
            .journal_query(&p.query, kinds.as_deref(), p.limit.unwrap_or(10))
        {
            Ok(hits) => ok_json(&hits),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Friction and reflection tools ───────────────────────────────────

    #[tool(description = "Log a friction point; similar descriptions increment the recurrence counter")]
    fn friction_log(
        &self,
        Parameters(p): Parameters<FrictionLogParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.friction_log(
            p.session_id.as_deref(),
            &p.description,
            &p.category,
            p.blocking.unwrap_or(false),
        ) {
            Ok(logged) => ok_json(&logged),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Store a reflection; sentences with insight markers crystallize into insights")]
    fn reflect(
        &self,
        Parameters(p): Parameters<ReflectParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.reflect(p.session_id.as_deref(), &p.content) {
            Ok(result) => ok_json(&result),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Maintenance tools ───────────────────────────────────────────────

    #[tool(description = "Check graph-wide significance of accumulated patterns; writes evolution proposals when warranted")]
    fn pattern_check(
        &self,
        Parameters(p): Parameters<PatternCheckParams>,
    ) -> Result<CallToolResult, McpError> {
        let check = self
            .librarians
            .pattern_check(p.session_id.as_deref(), p.generate_proposals.unwrap_or(true));
        ok_json(&check)
    }

    #[tool(description = "Run librarian maintenance: synthesizer, protector, pathfinder, or all")]
    fn librarian_run(
        &self,
        Parameters(p): Parameters<LibrarianRunParams>,
    ) -> Result<CallToolResult, McpError> {
        match p.which.as_deref().unwrap_or("all") {
            "synthesizer" => ok_json(&self.librarians.run_synthesizer()),
            "protector" => ok_json(&self.librarians.run_protector()),
            "pathfinder" => ok_json(&self.librarians.run_pathfinder()),
            "all" => ok_json(&self.librarians.run_all()),
            other => err_text(format!(
                "unknown librarian '{}', expected synthesizer, protector, pathfinder, or all",
                other
            )),
        }
    }
}

#[tool_handler]
impl ServerHandler for MnemaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "mnema MCP server — self-knowledge graph: sessions, journal, friction tracking, and librarian maintenance"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn build_embedder() -> Arc<dyn Embedder> {
    #[cfg(feature = "embeddings")]
    {
        match crate::embeddings::FastEmbedEmbedder::new() {
            Ok(embedder) => return Arc::new(embedder),
            Err(e) => eprintln!("embedding model unavailable ({}), falling back to text search", e),
        }
    }
    Arc::new(DisabledEmbedder)
}

pub fn run_mcp_server(db_path: PathBuf, telemetry_dir: PathBuf, proposals_dir: PathBuf) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let store: Arc<SqliteStore> = match SqliteStore::open(&db_path) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("failed to open database at {}: {}", db_path.display(), e);
                return 1;
            }
        };
        if let Err(e) = seed_reference_data(store.as_ref()) {
            eprintln!("failed to seed reference data: {}", e);
            return 1;
        }

        let telemetry = match TelemetrySink::new(&telemetry_dir) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                eprintln!("failed to open telemetry sink at {}: {}", telemetry_dir.display(), e);
                return 1;
            }
        };
        let proposals = match DirProposalStore::new(&proposals_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                eprintln!("failed to open proposal dir at {}: {}", proposals_dir.display(), e);
                return 1;
            }
        };

        let embedder = build_embedder();
        let api = Arc::new(KnowledgeApi::new(
            store.clone(),
            embedder.clone(),
            telemetry,
        ));
        let librarians = Arc::new(Librarians::new(store, embedder, proposals));

        let server = MnemaMcpServer::new(api, librarians);

        eprintln!("mnema mcp server starting on stdio...");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}
