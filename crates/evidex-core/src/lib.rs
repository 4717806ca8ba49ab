pub mod chunking;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{IndexError, Result};
pub use traits::Embedder;
