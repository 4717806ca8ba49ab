//! Embedding providers for the chunk index.
//!
//! `HashEmbedder` is deterministic and model-free; `BertEmbedder` runs a
//! sentence-transformer checkpoint locally through candle.

mod bert;
mod device;
mod hash;
mod pool;
mod tokenize;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use evidex_core::config::{expand_path, EmbeddingProvider, EmbeddingSettings};
use evidex_core::Embedder;
use tracing::info;

pub use bert::BertEmbedder;
pub use device::select_device;
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;

/// Build the provider named by `settings`. `APP_USE_FAKE_EMBEDDINGS=1`
/// forces the hashing embedder regardless of configuration.
pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if use_fake || settings.provider == EmbeddingProvider::Hash {
        info!(dim = settings.dimension, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dimension)));
    }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Arc::new(BertEmbedder::load(&model_dir, &settings.model_name, settings.max_length)?))
}

/// Locate the model directory: configured path, then `APP_MODEL_DIR`,
/// then `models/<model_name>` relative to the working directory.
pub fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let candidates = settings
        .model_dir
        .iter()
        .cloned()
        .chain(std::env::var("APP_MODEL_DIR").ok())
        .map(expand_path)
        .chain(std::iter::once(Path::new("models").join(&settings.model_name)));
    for dir in candidates {
        if dir.join("config.json").exists() {
            info!(dir = %dir.display(), "using model dir");
            return Ok(dir);
        }
    }
    Err(anyhow!("Could not locate a model directory for {}", settings.model_name))
}
