//! mnema CLI — self-knowledge graph engine with MCP server.
//!
//! Usage:
//!   mnema mcp [--transport stdio] [--data-dir path]
//!   mnema librarian <synthesizer|protector|pathfinder|all> [--data-dir path]
//!   mnema check [--session id] [--no-proposals] [--data-dir path]
//!   mnema init [--data-dir path]

use clap::{Parser, Subcommand};
use mnema::{
    seed_reference_data, DirProposalStore, DisabledEmbedder, Embedder, Librarians, OpenStore,
    SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mnema", version, about = "Self-knowledge graph engine")]
struct Cli {
    /// Data directory (defaults to ~/.local/share/mnema)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP (Model Context Protocol) server
    Mcp {
        /// Transport type (currently only stdio)
        #[arg(long, default_value = "stdio")]
        transport: String,
    },
    /// Run a librarian maintenance job
    Librarian {
        /// Which librarian: synthesizer, protector, pathfinder, or all
        #[arg(default_value = "all")]
        which: String,
    },
    /// Run a significance check over the whole graph
    Check {
        /// Session providing context for generated proposals
        #[arg(long)]
        session: Option<String>,
        /// Report findings without writing proposal documents
        #[arg(long)]
        no_proposals: bool,
    },
    /// Initialize the database and seed reference data
    Init,
}

struct DataDir {
    db: PathBuf,
    telemetry: PathBuf,
    proposals: PathBuf,
}

impl DataDir {
    fn resolve(explicit: Option<PathBuf>) -> Self {
        let root = explicit.unwrap_or_else(|| {
            let data_dir = dirs::data_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
            data_dir.join("mnema")
        });
        std::fs::create_dir_all(&root).ok();
        Self {
            db: root.join("mnema.db"),
            telemetry: root.join("telemetry"),
            proposals: root.join("proposals"),
        }
    }
}

fn build_embedder() -> Arc<dyn Embedder> {
    #[cfg(feature = "embeddings")]
    {
        match mnema::FastEmbedEmbedder::new() {
            Ok(embedder) => return Arc::new(embedder),
            Err(e) => eprintln!("embedding model unavailable ({}), continuing without", e),
        }
    }
    Arc::new(DisabledEmbedder)
}

fn open_librarians(dirs: &DataDir) -> Result<Librarians, String> {
    let store = SqliteStore::open(&dirs.db)
        .map_err(|e| format!("failed to open database at {}: {}", dirs.db.display(), e))?;
    let proposals = DirProposalStore::new(&dirs.proposals)
        .map_err(|e| format!("failed to open proposal dir: {}", e))?;
    Ok(Librarians::new(
        Arc::new(store),
        build_embedder(),
        Arc::new(proposals),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_librarian(dirs: &DataDir, which: &str) -> i32 {
    let librarians = match open_librarians(dirs) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match which {
        "synthesizer" => print_json(&librarians.run_synthesizer()),
        "protector" => print_json(&librarians.run_protector()),
        "pathfinder" => print_json(&librarians.run_pathfinder()),
        "all" => print_json(&librarians.run_all()),
        other => {
            eprintln!(
                "Error: unknown librarian '{}', expected synthesizer, protector, pathfinder, or all",
                other
            );
            1
        }
    }
}

fn cmd_check(dirs: &DataDir, session: Option<&str>, no_proposals: bool) -> i32 {
    let librarians = match open_librarians(dirs) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let check = librarians.pattern_check(session, !no_proposals);
    println!("{}", check.summary);
    print_json(&check)
}

fn cmd_init(dirs: &DataDir) -> i32 {
    let store = match SqliteStore::open(&dirs.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: failed to open database at {}: {}", dirs.db.display(), e);
            return 1;
        }
    };
    match seed_reference_data(&store) {
        Ok(created) => {
            println!(
                "Initialized {} ({} reference entities seeded)",
                dirs.db.display(),
                created
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let dirs = DataDir::resolve(cli.data_dir);

    let code = match cli.command {
        Commands::Mcp { transport } => {
            if transport != "stdio" {
                eprintln!("error: only 'stdio' transport is currently supported");
                std::process::exit(1);
            }
            mnema::mcp::run_mcp_server(dirs.db, dirs.telemetry, dirs.proposals)
        }
        Commands::Librarian { which } => cmd_librarian(&dirs, &which),
        Commands::Check { session, no_proposals } => {
            cmd_check(&dirs, session.as_deref(), no_proposals)
        }
        Commands::Init => cmd_init(&dirs),
    };
    std::process::exit(code);
}
