//! `SemanticIndex`: the thread-safe facade over store, ranker and expander.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use evidex_core::config::SearchSettings;
use evidex_core::types::{Chunk, ChunkRecord, DocumentMeta, IndexStatus, SearchResult};
use evidex_core::{Embedder, IndexError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::{expand, ContextPolicy};
use crate::rank::rank;
use crate::registry::DocumentRegistry;
use crate::stats::describe;
use crate::store::ChunkStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Falls back to `search.default_top_k` when unset.
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub context_window: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub searched_documents: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Default)]
struct IndexState {
    store: ChunkStore,
    documents: DocumentRegistry,
}

/// The chunk index plus the embedder that feeds it.
///
/// Embedding always runs outside the lock; the lock is held only for the
/// final append, for reset, and while ranking against a snapshot.
pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    settings: SearchSettings,
    state: RwLock<IndexState>,
}

impl SemanticIndex {
    pub fn new(embedder: Arc<dyn Embedder>, settings: SearchSettings) -> Self {
        Self {
            embedder,
            settings,
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Embed and append chunks that already carry their `source_document_id`.
    /// The batch is committed whole or not at all; an empty batch is a no-op.
    pub fn ingest(&self, chunks: Vec<Chunk>) -> Result<()> {
        if chunks.is_empty() {
            debug!("no chunks to add");
            return Ok(());
        }
        let vectors = self.embed_chunks(&chunks)?;
        let mut state = self.write()?;
        state.store.append(chunks, vectors)?;
        info!(total = state.store.size(), "indexing complete");
        Ok(())
    }

    /// Attribute `records` to `meta.document_id`, embed them and register the
    /// document in one step. Returns the number of chunks added.
    ///
    /// A document without any records is not registered.
    pub fn ingest_document(
        &self,
        mut meta: DocumentMeta,
        records: Vec<ChunkRecord>,
    ) -> Result<usize> {
        self.read()?.documents.ensure_absent(&meta.document_id)?;
        if records.is_empty() {
            warn!(document = %meta.document_id, "no chunks; document not registered");
            return Ok(0);
        }

        let chunks: Vec<Chunk> = records
            .into_iter()
            .map(|r| r.attach(meta.document_id.clone()))
            .collect();
        let vectors = self.embed_chunks(&chunks)?;
        meta.chunk_count = chunks.len();
        let added = chunks.len();

        let mut state = self.write()?;
        // Re-check: another ingest may have registered the id while we embedded.
        state.documents.ensure_absent(&meta.document_id)?;
        state.store.append(chunks, vectors)?;
        info!(
            document = %meta.document_id,
            added,
            total = state.store.size(),
            "document indexed"
        );
        state.documents.register(meta)?;
        Ok(added)
    }

    /// Top `top_k` chunks for `query`, optionally with `context_window`
    /// neighbours stitched around each hit.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        context_window: usize,
    ) -> Result<Vec<SearchResult>> {
        let request = SearchRequest {
            query: query.to_string(),
            top_k: Some(top_k),
            context_window,
        };
        Ok(self.execute(&request)?.results)
    }

    pub fn execute(&self, request: &SearchRequest) -> Result<SearchResponse> {
        if self.read()?.store.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        let query = normalize_query(&request.query)?;
        let top_k = request.top_k.unwrap_or(self.settings.default_top_k);
        if top_k == 0 {
            return Err(IndexError::InvalidQuery("top_k must be at least 1".into()));
        }
        let top_k = top_k.min(self.settings.max_top_k);

        let query_vec = self.embedder.embed(&query).map_err(|e| IndexError::Embedding {
            context: format!("query {query:?}"),
            message: format!("{e:#}"),
        })?;

        let state = self.read()?;
        let ranked = rank(state.store.all_vectors(), &query_vec, top_k)?;
        let policy = ContextPolicy::from_clamp_flag(self.settings.clamp_context_to_document);
        let results = ranked
            .into_iter()
            .map(|(position, score)| {
                let hit = SearchResult::from_chunk(state.store.get(position)?, score);
                expand(&state.store, hit, request.context_window, policy)
            })
            .collect::<Result<Vec<_>>>()?;
        let searched_documents = searched_documents(&state);
        debug!(query = %query, hits = results.len(), "search complete");

        Ok(SearchResponse {
            query,
            total_results: results.len(),
            searched_documents,
            results,
        })
    }

    /// Drop every chunk, vector and registered document.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.write()?;
        state.store.clear();
        state.documents.clear();
        info!("index cleared");
        Ok(())
    }

    pub fn describe(&self) -> Result<IndexStatus> {
        let state = self.read()?;
        Ok(describe(&state.store, &state.documents, self.embedder.model_id()))
    }

    pub fn documents(&self) -> Result<Vec<DocumentMeta>> {
        Ok(self.read()?.documents.list().to_vec())
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.read()?.store.size())
    }

    pub fn get(&self, position: usize) -> Result<Chunk> {
        self.read()?.store.get(position).cloned()
    }

    fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let context = || {
            let docs: BTreeSet<&str> =
                chunks.iter().map(|c| c.source_document_id.as_str()).collect();
            let docs: Vec<&str> = docs.into_iter().collect();
            format!("batch of {} chunks from {}", chunks.len(), docs.join(", "))
        };
        debug!(count = texts.len(), "embedding batch");
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| IndexError::Embedding {
                context: context(),
                message: format!("{e:#}"),
            })?;
        if vectors.len() != texts.len() {
            return Err(IndexError::Embedding {
                context: context(),
                message: format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                ),
            });
        }
        Ok(vectors)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexState>> {
        self.state.read().map_err(|_| IndexError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexState>> {
        self.state.write().map_err(|_| IndexError::LockPoisoned)
    }
}

fn searched_documents(state: &IndexState) -> usize {
    let mut ids: BTreeSet<&str> = state
        .store
        .chunks()
        .iter()
        .map(|c| c.source_document_id.as_str())
        .collect();
    ids.extend(state.documents.list().iter().map(|d| d.document_id.as_str()));
    ids.len()
}

/// Trim and collapse runs of whitespace. A query that is empty or has no
/// letter or digit at all is an `InvalidQuery`.
fn normalize_query(raw: &str) -> Result<String> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(IndexError::InvalidQuery("query is empty".into()));
    }
    if !normalized.chars().any(char::is_alphanumeric) {
        return Err(IndexError::InvalidQuery(format!(
            "query {normalized:?} has no searchable terms"
        )));
    }
    Ok(normalized)
}
