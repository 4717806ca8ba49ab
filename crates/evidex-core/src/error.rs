use thiserror::Error;

/// Failures surfaced by the chunk index and its facade.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No documents indexed; upload a document first")]
    EmptyIndex,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Embedding failed for {context}: {message}")]
    Embedding { context: String, message: String },

    #[error("Position {position} out of range for store of size {size}")]
    IndexOutOfRange { position: usize, size: usize },

    #[error("Store invariant violated: {chunks} chunks vs {vectors} vectors")]
    InvariantViolation { chunks: usize, vectors: usize },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document already indexed: {0}")]
    DuplicateDocument(String),

    #[error("Index lock poisoned by an earlier panic")]
    LockPoisoned,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IndexError {
    /// True for failures caused by the caller's input rather than by the index.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::EmptyIndex | Self::InvalidQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_split() {
        assert!(IndexError::EmptyIndex.is_user_facing());
        assert!(IndexError::InvalidQuery("empty".into()).is_user_facing());
        assert!(!IndexError::InvariantViolation { chunks: 1, vectors: 0 }.is_user_facing());
        assert!(!IndexError::LockPoisoned.is_user_facing());
    }

    #[test]
    fn embedding_error_names_the_batch() {
        let err = IndexError::Embedding {
            context: "batch of 3 chunks from a.pdf".into(),
            message: "empty input".into(),
        };
        assert_eq!(
            err.to_string(),
            "Embedding failed for batch of 3 chunks from a.pdf: empty input"
        );
    }
}
