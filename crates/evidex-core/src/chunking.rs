//! Splits extracted page text into overlapping word windows.

use serde::{Deserialize, Serialize};

use crate::config::ChunkingSettings;
use crate::types::{ChunkRecord, ExtractionMethod, PageText};

#[derive(Debug, Clone, Default)]
pub struct TextChunker {
    settings: ChunkingSettings,
}

impl TextChunker {
    pub fn new(settings: ChunkingSettings) -> Self {
        Self { settings }
    }

    /// Chunk every page of one document. Chunks never span two pages and are
    /// numbered from 0 across the whole document.
    ///
    /// Windows without a single letter or digit (rules, dot leaders, page
    /// furniture) are dropped.
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<ChunkRecord> {
        let mut records = Vec::new();
        for page in pages {
            for (start, end) in self.windows(&page.text) {
                if !page.text[start..end].chars().any(char::is_alphanumeric) {
                    continue;
                }
                records.push(ChunkRecord {
                    chunk_id: records.len(),
                    page_number: page.page_number,
                    text: page.text[start..end].to_string(),
                    start_offset: page.text[..start].chars().count(),
                    end_offset: page.text[..end].chars().count(),
                });
            }
        }
        records
    }

    /// Byte ranges of each word window in `text`.
    fn windows(&self, text: &str) -> Vec<(usize, usize)> {
        let words: Vec<(usize, usize)> = word_spans(text);
        if words.is_empty() {
            return vec![];
        }
        let max_words = self.settings.max_words.max(1);
        let step = max_words.saturating_sub(self.settings.overlap_words).max(1);

        let mut out = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + max_words).min(words.len());
            out.push((words[start].0, words[end - 1].1));
            if end >= words.len() {
                break;
            }
            start += step;
        }
        out
    }
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut current: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), current) {
            (true, Some(begin)) => {
                spans.push((begin, idx));
                current = None;
            }
            (false, None) => current = Some(idx),
            _ => {}
        }
    }
    if let Some(begin) = current {
        spans.push((begin, text.len()));
    }
    spans
}

/// Per-document extraction counters reported back to the uploader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub pages_with_ocr: usize,
    pub pages_direct_text: usize,
    pub total_characters: usize,
}

impl ProcessingSummary {
    pub fn from_pages(pages: &[PageText]) -> Self {
        pages.iter().fold(Self::default(), |mut acc, page| {
            match page.method {
                ExtractionMethod::Ocr => acc.pages_with_ocr += 1,
                ExtractionMethod::Direct => acc.pages_direct_text += 1,
            }
            acc.total_characters += page.character_count;
            acc
        })
    }
}
