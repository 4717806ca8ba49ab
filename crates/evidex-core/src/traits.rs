/// Text-to-vector provider shared by ingestion and query paths.
///
/// Implementations must return vectors of width `dim()` for every input and
/// stay on one model for their whole lifetime so scores remain comparable.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model behind this provider.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    /// Embed a batch; the output has one vector per input, in input order.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}
