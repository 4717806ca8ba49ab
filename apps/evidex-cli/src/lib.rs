//! Loading text documents from disk and feeding them to a [`SemanticIndex`].
//!
//! A document is a UTF-8 text file (as produced by `pdftotext` or an OCR
//! pass); pages are separated by form feeds.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use evidex_core::chunking::{ProcessingSummary, TextChunker};
use evidex_core::types::{DocumentMeta, ExtractionMethod, PageText};
use evidex_index::SemanticIndex;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

const PAGE_BREAK: char = '\u{c}';

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub meta: DocumentMeta,
    pub pages: Vec<PageText>,
}

/// A text file on disk and the id it is indexed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub document_id: String,
}

/// Expand directories into the `.txt` files beneath them, sorted; plain
/// file arguments are kept as given.
///
/// Files found under a directory are identified by their path relative to
/// it (`case1/notes.txt`), plain files by their name. An id seen before gets
/// a `#2`, `#3`, ... suffix.
pub fn collect_text_files(inputs: &[PathBuf]) -> Vec<SourceFile> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut files = Vec::new();
    for input in inputs {
        let found: Vec<(PathBuf, String)> = if input.is_dir() {
            let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
                .collect();
            paths.sort();
            paths
                .into_iter()
                .map(|p| {
                    let id = relative_id(input, &p);
                    (p, id)
                })
                .collect()
        } else {
            vec![(input.clone(), file_name(input))]
        };

        for (path, id) in found {
            let count = seen.entry(id.clone()).or_insert(0);
            *count += 1;
            let document_id = if *count == 1 {
                id
            } else {
                format!("{id}#{count}")
            };
            files.push(SourceFile { path, document_id });
        }
    }
    files
}

fn relative_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

pub fn load_document(path: &Path, document_id: &str) -> Result<LoadedDocument> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let pages: Vec<PageText> = text
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| PageText::new(i + 1, page, ExtractionMethod::Direct))
        .collect();

    Ok(LoadedDocument {
        meta: DocumentMeta {
            document_id: document_id.to_string(),
            filename: file_name(path),
            page_count: pages.len(),
            chunk_count: 0,
            uploaded_at: Utc::now(),
            size_bytes: bytes.len() as u64,
        },
        pages,
    })
}

/// Chunk and index every file in `files`. Returns what was read, in
/// order, with per-document extraction counters.
pub fn ingest_files(
    index: &SemanticIndex,
    chunker: &TextChunker,
    files: &[SourceFile],
    show_progress: bool,
) -> Result<Vec<(DocumentMeta, ProcessingSummary)>> {
    let pb = if show_progress {
        ProgressBar::new(files.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut ingested = Vec::with_capacity(files.len());
    for file in files {
        let doc = load_document(&file.path, &file.document_id)?;
        pb.set_message(doc.meta.document_id.clone());
        let records = chunker.chunk_pages(&doc.pages);
        if records.is_empty() {
            warn!(file = %file.path.display(), "no text found");
        }
        let summary = ProcessingSummary::from_pages(&doc.pages);
        let added = index.ingest_document(doc.meta.clone(), records)?;
        info!(
            file = %file.path.display(),
            document = %file.document_id,
            pages = doc.meta.page_count,
            chunks = added,
            "document ingested"
        );
        ingested.push((DocumentMeta { chunk_count: added, ..doc.meta }, summary));
        pb.inc(1);
    }
    pb.finish_with_message("done");
    Ok(ingested)
}

/// Install the `RUST_LOG`-driven subscriber on stderr.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use evidex_core::config::{ChunkingSettings, SearchSettings};
    use evidex_core::types::IndexStatus;
    use evidex_embed::HashEmbedder;
    use tempfile::TempDir;

    fn index() -> SemanticIndex {
        SemanticIndex::new(Arc::new(HashEmbedder::new(384)), SearchSettings::default())
    }

    fn ids(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.document_id.as_str()).collect()
    }

    #[test]
    fn pages_split_on_form_feed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("police_report.txt");
        fs::write(
            &path,
            "The suspect drove a red sedan.\u{c}A knife was found at the scene.",
        )
        .unwrap();

        let doc = load_document(&path, "police_report.txt").unwrap();
        assert_eq!(doc.meta.document_id, "police_report.txt");
        assert_eq!(doc.meta.page_count, 2);
        assert_eq!(doc.pages[1].page_number, 2);
        assert_eq!(doc.pages[1].text, "A knife was found at the scene.");
    }

    #[test]
    fn directories_expand_to_sorted_txt_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("b.txt"), "bravo").unwrap();
        fs::write(tmp.path().join("nested/a.txt"), "alpha").unwrap();
        fs::write(tmp.path().join("skip.pdf"), "binary").unwrap();

        let files = collect_text_files(&[tmp.path().to_path_buf()]);
        assert_eq!(ids(&files), vec!["b.txt", "nested/a.txt"]);
        assert_eq!(files[1].path, tmp.path().join("nested/a.txt"));
    }

    #[test]
    fn same_file_name_in_different_folders_gets_distinct_ids() {
        let tmp = TempDir::new().unwrap();
        for case in ["case1", "case2"] {
            fs::create_dir(tmp.path().join(case)).unwrap();
        }
        fs::write(tmp.path().join("case1/notes.txt"), "A knife was found.").unwrap();
        fs::write(tmp.path().join("case2/notes.txt"), "The car left.").unwrap();

        let files = collect_text_files(&[tmp.path().to_path_buf()]);
        assert_eq!(ids(&files), vec!["case1/notes.txt", "case2/notes.txt"]);

        let index = index();
        let chunker = TextChunker::new(ChunkingSettings::default());
        let ingested = ingest_files(&index, &chunker, &files, false).unwrap();
        assert_eq!(ingested.len(), 2);
        assert!(ingested.iter().all(|(meta, _)| meta.filename == "notes.txt"));
        assert_eq!(index.documents().unwrap().len(), 2);

        let hits = index.search("knife", 1, 0).unwrap();
        assert_eq!(hits[0].source_document_id, "case1/notes.txt");
    }

    #[test]
    fn repeated_inputs_are_suffixed() {
        let tmp = TempDir::new().unwrap();
        for dir in ["a", "b"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
            fs::write(tmp.path().join(dir).join("notes.txt"), "notes").unwrap();
        }
        let inputs = [tmp.path().join("a"), tmp.path().join("b/notes.txt")];
        let files = collect_text_files(&inputs);
        assert_eq!(ids(&files), vec!["notes.txt", "notes.txt#2"]);
    }

    #[test]
    fn separator_pages_do_not_abort_ingestion() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("r.txt"), "A knife was found.\u{c}- - -").unwrap();
        let files = collect_text_files(&[tmp.path().to_path_buf()]);

        let index = index();
        let chunker = TextChunker::new(ChunkingSettings::default());
        let ingested = ingest_files(&index, &chunker, &files, false).unwrap();
        assert_eq!(ingested[0].0.page_count, 2);
        assert_eq!(ingested[0].0.chunk_count, 1);
        assert_eq!(index.size().unwrap(), 1);
    }

    #[test]
    fn ingest_files_registers_documents() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("report.txt"), "A knife was found.\u{c}The car left.").unwrap();
        fs::write(tmp.path().join("statement.txt"), "I saw a red car.").unwrap();
        let files = collect_text_files(&[tmp.path().to_path_buf()]);

        let index = index();
        let chunker = TextChunker::new(ChunkingSettings::default());
        let ingested = ingest_files(&index, &chunker, &files, false).unwrap();

        assert_eq!(ingested.len(), 2);
        assert_eq!(ingested[0].0.chunk_count, 2);
        assert_eq!(ingested[0].1.pages_direct_text, 2);
        assert_eq!(index.documents().unwrap().len(), 2);
        let IndexStatus::Populated(stats) = index.describe().unwrap() else {
            panic!("expected populated index")
        };
        assert_eq!(stats.total_pages, 3);

        let hits = index.search("knife", 1, 0).unwrap();
        assert_eq!(hits[0].source_document_id, "report.txt");
    }
}
