//! Domain types shared by ingestion, the chunk index and its callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// How the text of a page was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Direct,
    Ocr,
}

/// Extracted text of one page, as produced by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
    pub method: ExtractionMethod,
    pub character_count: usize,
}

impl PageText {
    pub fn new(page_number: usize, text: impl Into<String>, method: ExtractionMethod) -> Self {
        let text = text.into();
        let character_count = text.chars().count();
        Self { page_number, text, method, character_count }
    }
}

/// A chunk as emitted by the chunker, before it is attributed to a document.
///
/// - `chunk_id`: position within its own document, from 0
/// - `page_number`: 1-based page within the document
/// - `start_offset`/`end_offset`: character offsets into the page text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkRecord {
    pub chunk_id: usize,
    pub page_number: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl ChunkRecord {
    pub fn attach(self, source_document_id: impl Into<DocumentId>) -> Chunk {
        Chunk {
            chunk_id: self.chunk_id,
            page_number: self.page_number,
            text: self.text,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            source_document_id: source_document_id.into(),
        }
    }
}

/// An indexed unit of text.
///
/// Once stored, `chunk_id` is the chunk's position in the store; it is
/// unique across every document ingested since the last reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: usize,
    pub page_number: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub source_document_id: DocumentId,
}

/// One ranked hit. Recomputed per query, never stored.
///
/// `score_percentage` is `similarity_score * 100` and is negative when the
/// similarity is negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub chunk_id: usize,
    pub page_number: usize,
    pub text: String,
    pub source_document_id: DocumentId,
    pub similarity_score: f32,
    pub score_percentage: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_after: Option<String>,
}

impl SearchResult {
    pub fn from_chunk(chunk: &Chunk, similarity_score: f32) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            page_number: chunk.page_number,
            text: chunk.text.clone(),
            source_document_id: chunk.source_document_id.clone(),
            similarity_score,
            score_percentage: similarity_score * 100.0,
            context_before: None,
            context_after: None,
        }
    }
}

/// Metadata the ingestion layer records per uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMeta {
    pub document_id: DocumentId,
    pub filename: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Aggregate counters over a populated index.
///
/// `total_pages` counts distinct `(document, page)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_pages: usize,
    pub total_characters: usize,
    pub average_chunk_size: usize,
    pub total_documents: usize,
    pub model_identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexStatus {
    Empty,
    Populated(IndexStats),
}

impl IndexStatus {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
