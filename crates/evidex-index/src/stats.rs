//! Aggregate counters over the index.

use std::collections::HashSet;

use evidex_core::types::{IndexStats, IndexStatus};

use crate::registry::DocumentRegistry;
use crate::store::ChunkStore;

/// Summarize the store. An empty store reports [`IndexStatus::Empty`].
///
/// Pages are counted per `(document, page_number)` so page 1 of two
/// documents counts twice. Documents are the union of registered documents
/// and the distinct sources of stored chunks.
pub fn describe(
    store: &ChunkStore,
    registry: &DocumentRegistry,
    model_identifier: &str,
) -> IndexStatus {
    if store.is_empty() {
        return IndexStatus::Empty;
    }
    let chunks = store.chunks();
    let total_characters: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
    let pages: HashSet<(&str, usize)> =
        chunks.iter().map(|c| (c.source_document_id.as_str(), c.page_number)).collect();
    let documents: HashSet<&str> = chunks
        .iter()
        .map(|c| c.source_document_id.as_str())
        .chain(registry.list().iter().map(|d| d.document_id.as_str()))
        .collect();

    IndexStatus::Populated(IndexStats {
        total_chunks: chunks.len(),
        total_pages: pages.len(),
        total_characters,
        average_chunk_size: total_characters / chunks.len(),
        total_documents: documents.len(),
        model_identifier: model_identifier.to_string(),
    })
}
