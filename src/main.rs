//! # ragdex CLI
//!
//! The `ragdex` binary answers questions over local documents without
//! any persistent state: each invocation extracts, chunks, optionally
//! embeds and indexes the inputs, then runs the query.
//!
//! ## Usage
//!
//! ```bash
//! ragdex --config ./ragdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragdex chunks --input <FILES>` | Preview how the inputs chunk, without indexing |
//! | `ragdex ask "<query>" --input <FILES>` | Index the inputs and answer one query |
//!
//! ## Examples
//!
//! ```bash
//! # Preview chunking for a PDF
//! ragdex chunks --input policy.pdf
//!
//! # Vector retrieval over two documents (downloads the model on first use)
//! ragdex ask "what is the baggage allowance" --input policy.pdf --input faq.md
//!
//! # Lexical-only retrieval, no model involved
//! ragdex ask "refund window" --input policy.pdf --backend lexical
//!
//! # Machine-readable output
//! ragdex ask "refund window" --input policy.pdf --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ragdex::config;
use ragdex::embedding::EmbeddingModelId;
use ragdex::ingest;
use ragdex::models::SearchBackend;
use ragdex::search;

/// ragdex — local RAG indexing and retrieval over your own documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; a missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "ragdex",
    about = "Local RAG indexing and retrieval: chunk, embed, index, and query documents on your machine",
    version,
    long_about = "ragdex chunks local documents (PDF, text, Markdown) with a sliding window, \
    embeds them with a locally-run MiniLM model, builds an exact inner-product index, and answers \
    top-k queries. When embeddings are unavailable it degrades to lexical token-overlap scoring \
    instead of failing."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./ragdex.toml`. Chunking, retrieval, and embedding
    /// settings are read from this file; a missing file is not an error.
    #[arg(long, global = true, default_value = "./ragdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Preview how the inputs would chunk.
    ///
    /// Extracts and chunks every input file, prints per-file page counts,
    /// the total chunk count, and the first few chunks. Nothing is
    /// embedded or indexed.
    Chunks {
        /// Input document. Repeat for multiple files (.pdf, .txt, .md).
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Index the inputs and answer one query.
    ///
    /// Runs the full pipeline (extract, chunk, embed, index) over the
    /// inputs and prints the top-k chunks for the query. Falls back to
    /// lexical scoring when the embedding model cannot serve.
    Ask {
        /// The query string.
        query: String,

        /// Input document. Repeat for multiple files (.pdf, .txt, .md).
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Retrieval backend: `vector` (embedding similarity) or `lexical`
        /// (token overlap). Overrides the config value.
        #[arg(long)]
        backend: Option<SearchBackend>,

        /// Number of results to return. Overrides the config value.
        #[arg(long)]
        top_k: Option<usize>,

        /// Embedding model: `all-minilm-l6-v2` or `all-minilm-l6-v2-q`.
        /// Overrides the config value.
        #[arg(long)]
        model: Option<EmbeddingModelId>,

        /// Print results as JSON instead of the human-readable listing.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chunks { inputs } => ingest::run_chunks(&config, &inputs),
        Commands::Ask {
            query,
            inputs,
            backend,
            top_k,
            model,
            json,
        } => search::run_ask(&config, &query, &inputs, backend, top_k, model, json).await,
    }
}
