//! In-memory semantic chunk index.
//!
//! [`ChunkStore`] keeps chunks and their vectors in lock-step, [`rank`]
//! scores every stored vector against a query, [`expand`] stitches the text of
//! positional neighbours around a hit, and [`SemanticIndex`] ties them to an
//! [`Embedder`](evidex_core::Embedder) behind a single lock.

pub mod context;
pub mod engine;
pub mod rank;
pub mod registry;
pub mod stats;
pub mod store;

pub use context::{expand, ContextPolicy};
pub use engine::{SearchRequest, SearchResponse, SemanticIndex};
pub use rank::{cosine_similarity, rank};
pub use registry::DocumentRegistry;
pub use stats::describe;
pub use store::ChunkStore;
