//! # Context Sync CLI (`ctx-sync`)
//!
//! Keeps a vector index synchronized with a versioned markdown registry.
//!
//! ## Usage
//!
//! ```bash
//! ctx-sync --config ./config/sync.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ctx-sync init` | Create the vector collection if it does not exist |
//! | `ctx-sync sync` | Scan the registry and reconcile the index |
//! | `ctx-sync sync --force` | Reprocess every document regardless of checksum |
//! | `ctx-sync sync --dry-run` | Show document and chunk counts without writing |
//!
//! The process exits 0 only when a run completes with zero per-document
//! errors; configuration problems abort before any scanning occurs.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use context_sync::chunk::MarkdownChunker;
use context_sync::config::{self, Config};
use context_sync::embedding::create_provider;
use context_sync::index::{QdrantIndex, VectorIndex};
use context_sync::report::{render_report, ReportContext, SyncStats};
use context_sync::scanner::scan_registry;
use context_sync::sync::SyncOrchestrator;

/// Context Sync — keep a vector index aligned with a markdown registry.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/sync.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ctx-sync",
    about = "Keep a vector index synchronized with a versioned markdown registry",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vector collection if it does not exist.
    ///
    /// Idempotent — running it against an existing collection is safe.
    Init,

    /// Scan the registry and reconcile the index.
    ///
    /// New and changed documents are chunked, embedded, and upserted;
    /// unchanged documents are skipped by checksum; documents removed from
    /// disk are deleted from the index.
    Sync {
        /// Reprocess every document regardless of stored checksums.
        #[arg(long)]
        force: bool,

        /// Scan and chunk without writing to the index.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            1
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let index = QdrantIndex::new(&config.index)?;
            index.ensure_collection().await?;
            println!(
                "Collection '{}' ready at {}.",
                config.index.collection, config.index.url
            );
            Ok(0)
        }
        Commands::Sync { force, dry_run } => run_sync(&config, force, dry_run).await,
    }
}

async fn run_sync(config: &Config, force: bool, dry_run: bool) -> Result<i32> {
    info!(root = %config.registry.root.display(), "scanning registry");
    let scan = scan_registry(&config.registry.root)?;
    info!(documents = scan.documents.len(), "scan complete");

    let chunker = MarkdownChunker::new(&config.chunking);

    if dry_run {
        let total_chunks: usize = scan
            .documents
            .iter()
            .map(|doc| chunker.chunk_document(&doc.content, &doc.relative_path).len())
            .sum();
        println!("sync (dry-run)");
        println!("  documents found: {}", scan.documents.len());
        println!("  estimated chunks: {}", total_chunks);
        println!("  folder errors: {}", scan.errors.len());
        for err in &scan.errors {
            println!("    - {}", err);
        }
        return Ok(0);
    }

    let index = QdrantIndex::new(&config.index)?;
    index.ensure_collection().await?;

    let provider = create_provider(&config.embedding, config.index.vector_size)?;
    info!(model = provider.model_name(), "embedding provider ready");

    let mut stats = SyncStats::new();
    for err in scan.errors {
        stats.record_error(err);
    }
    for warning in scan.warnings {
        stats.record_warning(warning);
    }

    let orchestrator = SyncOrchestrator::new(&chunker, &*provider, &index, force);

    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing current document");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    orchestrator.run(&scan.documents, &mut stats).await?;
    stats.finish();

    let total_records = index.total_count().await.unwrap_or(0);
    let root_display = config.registry.root.display().to_string();
    let report = render_report(
        &stats,
        &ReportContext {
            registry_root: &root_display,
            index_url: &config.index.url,
            collection: &config.index.collection,
            model: provider.model_name(),
            total_records,
        },
    );
    println!("{report}");

    Ok(stats.exit_code())
}
