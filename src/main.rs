//! # docrecall CLI (`recall`)
//!
//! Index one document and run top-k retrieval against it.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./config/recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall index <FILE>` | Chunk, embed and index a document (`-` reads stdin) |
//! | `recall search "<query>"` | Top-k chunks for a query |
//! | `recall status` | Show the generation being served |
//! | `recall clear` | Forget the indexed document |
//!
//! Log verbosity follows `RUST_LOG` (default `docrecall=info`); logs go to
//! stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use docrecall::{commands, config};

/// docrecall: semantic retrieval over a single document with keyword
/// fallback.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "Semantic retrieval over a single document with keyword fallback",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/recall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a document, replacing the previous one.
    ///
    /// The new index becomes visible only once it is complete; searches
    /// keep using the previous one until then.
    Index {
        /// Text file to index, or `-` for stdin.
        file: PathBuf,
        /// Characters per chunk (overrides `[chunking].size`).
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters shared by consecutive chunks (overrides `[chunking].overlap`).
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Search the indexed document.
    Search {
        query: String,
        /// Number of results (defaults to `[retrieval].default_k`).
        #[arg(short, long)]
        k: Option<usize>,
        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show index status.
    Status,

    /// Remove the indexed document.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docrecall=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index {
            file,
            chunk_size,
            overlap,
        } => {
            commands::run_index(&cfg, &file, chunk_size, overlap).await?;
        }
        Commands::Search { query, k, json } => {
            commands::run_search(&cfg, &query, k, json).await?;
        }
        Commands::Status => {
            commands::run_status(&cfg).await?;
        }
        Commands::Clear => {
            commands::run_clear(&cfg).await?;
        }
    }

    Ok(())
}
