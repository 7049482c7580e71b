//! # ragdoc CLI
//!
//! Command-line interface for ragdoc, a structure-aware document chunker for
//! retrieval pipelines.
//!
//! ## Commands
//!
//! - `ragdoc chunk <FILE>` - Process and chunk a single document
//! - `ragdoc ingest [CORPUS]` - Chunk a whole corpus into a JSON Lines file
//! - `ragdoc config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Inspect how a document is chunked
//! ragdoc chunk docs/guide.md
//!
//! # Get JSON output
//! ragdoc chunk docs/report.pdf --format json
//!
//! # Ingest a corpus, replacing previous output
//! ragdoc ingest ./docs --output chunks.jsonl --clean
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragdoc_chunker::{DocumentChunker, TiktokenEncoder};
use ragdoc_core::{DocumentChunk, TokenEncoder, VectorStore};
use ragdoc_extract::DocumentProcessor;
use ragdoc_index::{DocumentStatus, IngestReport, IngestUpdate, Ingester};
use ragdoc_store::JsonlStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "ragdoc")]
#[command(about = "Structure-aware document chunking for retrieval pipelines")]
#[command(version)]
struct Cli {
    /// Path to config file (default: platform config dir, e.g. ~/.config/ragdoc/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Process and chunk a single file
    Chunk {
        /// File to chunk (.md, .markdown, .txt or .pdf)
        file: PathBuf,
    },

    /// Chunk every supported file under a corpus directory
    Ingest {
        /// Corpus directory (default: ingest.corpus_path from config)
        corpus: Option<PathBuf>,

        /// Output JSON Lines file (default: ingest.output from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove previous output before ingesting
        #[arg(long)]
        clean: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for the chunk command.
#[derive(Serialize)]
struct ChunkOutput<'a> {
    file: String,
    title: &'a str,
    token_count: usize,
    chunks: &'a [DocumentChunk],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_from(cli.config.clone()).context("Failed to load config")?;

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.tracing_level()?
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Chunk { file } => {
            config::check(&config)?;
            if !file.is_file() {
                anyhow::bail!("File does not exist: {}", file.display());
            }

            let (processor, chunker) = create_components(&config)?;
            let document = processor
                .process_file(&file)
                .await
                .with_context(|| format!("Failed to process {}", file.display()))?;
            let chunks = chunker
                .chunk_document(&document)
                .with_context(|| format!("Failed to chunk {}", file.display()))?;

            match cli.format {
                OutputFormat::Json => {
                    let output = ChunkOutput {
                        file: file.display().to_string(),
                        title: document.title(),
                        token_count: document.token_count(),
                        chunks: &chunks,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{} ({}): {} tokens, {} chunks\n",
                        document.title(),
                        document.file_name(),
                        document.token_count(),
                        chunks.len()
                    );
                    for chunk in &chunks {
                        print_chunk(chunk);
                    }
                }
            }
        }

        Commands::Ingest {
            corpus,
            output,
            clean,
        } => {
            config::check(&config)?;
            let corpus = corpus.unwrap_or_else(|| config.ingest.corpus_path.clone());
            let output = output.unwrap_or_else(|| config.ingest.output.clone());
            if !corpus.exists() {
                anyhow::bail!("Corpus does not exist: {}", corpus.display());
            }

            info!("Ingesting {:?} into {:?}", corpus, output);

            let (processor, chunker) = create_components(&config)?;
            let store: Arc<dyn VectorStore> = Arc::new(JsonlStore::new(&output));
            let ingester = Ingester::new(
                Arc::new(processor),
                Arc::new(chunker),
                Arc::clone(&store),
                config.ingest.ingest_config(clean),
            );

            // Subscribe to updates for progress
            let mut updates = ingester.subscribe();
            let progress_handle = tokio::spawn(log_progress(updates));

            let report = ingester
                .run(&corpus)
                .await
                .with_context(|| format!("Ingestion of {} failed", corpus.display()))?;
            drop(ingester);
            let _ = progress_handle.await;

            let stats = store.stats().await?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Text => print_report(&report, &output, stats.total_chunks),
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

/// Log ingestion progress until the run completes or the channel closes.
///
/// Returns the number of documents reported.
async fn log_progress(mut updates: broadcast::Receiver<IngestUpdate>) -> usize {
    let mut reported = 0;
    loop {
        match updates.recv().await {
            Ok(IngestUpdate::DocumentChunked { path, chunk_count }) => {
                reported += 1;
                info!("Chunked: {:?} ({} chunks)", path, chunk_count);
            }
            Ok(IngestUpdate::DocumentFailed { path, error }) => {
                reported += 1;
                warn!("Error: {:?}: {}", path, error);
            }
            Ok(IngestUpdate::RunCompleted { .. }) | Err(RecvError::Closed) => break,
            Ok(
                IngestUpdate::RunStarted { .. }
                | IngestUpdate::DocumentStarted { .. }
                | IngestUpdate::BatchUpserted { .. },
            ) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!("Progress display skipped {} updates", skipped);
            }
        }
    }
    reported
}

/// Build the document processor and chunker from configuration.
fn create_components(config: &Config) -> Result<(DocumentProcessor, DocumentChunker)> {
    let encoder: Arc<dyn TokenEncoder> = Arc::new(
        TiktokenEncoder::new(&config.chunking.encoding).context("Failed to load tokenizer")?,
    );
    let chunker = DocumentChunker::new(config.chunking.chunking_config(), Arc::clone(&encoder))
        .context("Invalid chunking configuration")?;
    Ok((DocumentProcessor::new(encoder), chunker))
}

fn print_chunk(chunk: &DocumentChunk) {
    let metadata = &chunk.metadata;
    let mut location = String::new();
    if let Some(section) = &metadata.section_header {
        location.push_str(&format!(", section {section:?}"));
    }
    if let Some(page) = metadata.page_number {
        location.push_str(&format!(", page {page}"));
    }

    println!(
        "{}. {} ({} tokens{})",
        metadata.chunk_index + 1,
        chunk.id,
        metadata.token_count,
        location
    );
    println!("   {}", truncate(&chunk.content, 100));
    println!();
}

fn print_report(report: &IngestReport, output: &Path, stored: u64) {
    println!("Ingested {}", report.corpus.display());
    println!("  Documents: {}", report.documents.len());
    println!("  Succeeded: {}", report.succeeded());
    println!("  Failed:    {}", report.failed());
    println!("  Chunks:    {}", report.total_chunks);
    println!("  Output:    {} ({} records)", output.display(), stored);
    println!("  Time:      {} ms", report.elapsed_ms);

    let failures: Vec<_> = report
        .documents
        .iter()
        .filter_map(|d| match &d.status {
            DocumentStatus::Failed { error } => Some((&d.path, error)),
            DocumentStatus::Chunked { .. } => None,
        })
        .collect();
    if !failures.is_empty() {
        println!("\nFailures:");
        for (path, error) in failures {
            println!("  {}: {}", path.display(), error);
        }
    }
}

/// Truncate a string to max characters, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
