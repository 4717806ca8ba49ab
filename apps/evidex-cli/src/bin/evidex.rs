use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use evidex_cli::{collect_text_files, ingest_files, init_tracing};
use evidex_core::chunking::TextChunker;
use evidex_core::config::{Config, Settings};
use evidex_core::types::IndexStatus;
use evidex_core::IndexError;
use evidex_embed::load_embedder;
use evidex_index::{SearchRequest, SemanticIndex};

#[derive(Parser)]
#[command(name = "evidex", about = "Semantic search across discovery documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index the given documents and run one query against them
    Search {
        query: String,
        /// Text files or directories of `.txt` files
        #[arg(long = "doc", required = true)]
        docs: Vec<PathBuf>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Neighbouring chunks to show around each hit
        #[arg(long)]
        context: Option<usize>,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Index the given documents and print statistics
    Stats {
        #[arg(long = "doc", required = true)]
        docs: Vec<PathBuf>,
    },
}

fn build_index(settings: &Settings, docs: &[PathBuf]) -> Result<SemanticIndex> {
    let embedder = load_embedder(&settings.embedding)?;
    let index = SemanticIndex::new(embedder, settings.search.clone());
    let files = collect_text_files(docs);
    let chunker = TextChunker::new(settings.chunking.clone());
    for (meta, summary) in ingest_files(&index, &chunker, &files, true)? {
        eprintln!(
            "{}: {} pages ({} direct, {} ocr), {} chunks, {} characters",
            meta.document_id,
            meta.page_count,
            summary.pages_direct_text,
            summary.pages_with_ocr,
            meta.chunk_count,
            summary.total_characters
        );
    }
    Ok(index)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Config::load()?.settings()?;

    match cli.command {
        Command::Search { query, docs, top_k, context, json } => {
            let index = build_index(&settings, &docs)?;
            let request = SearchRequest {
                query,
                top_k,
                context_window: context.unwrap_or(settings.search.context_window),
            };
            let response = match index.execute(&request) {
                Ok(response) => response,
                Err(e) if e.is_user_facing() => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }
            println!(
                "Found {} results for \"{}\" across {} documents",
                response.total_results, response.query, response.searched_documents
            );
            for (i, r) in response.results.iter().enumerate() {
                println!(
                    "\n  {}. {:.1}%  {}  page {}  chunk {}",
                    i + 1,
                    r.score_percentage,
                    r.source_document_id,
                    r.page_number,
                    r.chunk_id
                );
                if let Some(before) = &r.context_before {
                    println!("     ... {before}");
                }
                println!("     {}", r.text);
                if let Some(after) = &r.context_after {
                    println!("     {after} ...");
                }
            }
        }
        Command::Stats { docs } => {
            let index = build_index(&settings, &docs)?;
            match index.describe()? {
                IndexStatus::Empty => println!("{}", IndexError::EmptyIndex),
                status => println!("{}", serde_json::to_string_pretty(&status)?),
            }
        }
    }
    Ok(())
}
