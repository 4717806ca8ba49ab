//! Provenance bookkeeping for ingested documents.

use evidex_core::types::DocumentMeta;
use evidex_core::{IndexError, Result};

/// Documents in upload order.
#[derive(Debug, Default, Clone)]
pub struct DocumentRegistry {
    documents: Vec<DocumentMeta>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.documents.iter().any(|d| d.document_id == document_id)
    }

    pub fn ensure_absent(&self, document_id: &str) -> Result<()> {
        if self.contains(document_id) {
            return Err(IndexError::DuplicateDocument(document_id.to_string()));
        }
        Ok(())
    }

    pub fn register(&mut self, meta: DocumentMeta) -> Result<()> {
        self.ensure_absent(&meta.document_id)?;
        self.documents.push(meta);
        Ok(())
    }

    pub fn list(&self) -> &[DocumentMeta] {
        &self.documents
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(id: &str) -> DocumentMeta {
        DocumentMeta {
            document_id: id.into(),
            filename: id.into(),
            page_count: 1,
            chunk_count: 1,
            uploaded_at: Utc::now(),
            size_bytes: 10,
        }
    }

    #[test]
    fn keeps_upload_order_and_rejects_duplicates() {
        let mut registry = DocumentRegistry::new();
        registry.register(meta("b.pdf")).unwrap();
        registry.register(meta("a.pdf")).unwrap();
        let ids: Vec<&str> = registry.list().iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["b.pdf", "a.pdf"]);

        assert!(matches!(
            registry.register(meta("a.pdf")),
            Err(IndexError::DuplicateDocument(id)) if id == "a.pdf"
        ));
        assert_eq!(registry.list().len(), 2);
        assert!(registry.contains("b.pdf"));

        registry.clear();
        assert!(registry.list().is_empty());
        registry.register(meta("a.pdf")).unwrap();
    }
}
