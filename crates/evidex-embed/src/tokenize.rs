use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Configure `tokenizer` to pad each batch to its longest member and to cut
/// inputs at `max_len` tokens.
pub fn configure(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Failed to configure truncation: {e}"))?;
    Ok(())
}

/// Encode a batch into `(input_ids, attention_mask)`, both `[batch, tokens]`.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {e}"))?;
    let mut ids = Vec::with_capacity(encodings.len());
    let mut masks = Vec::with_capacity(encodings.len());
    for enc in &encodings {
        ids.push(Tensor::new(enc.get_ids(), device)?);
        masks.push(Tensor::new(enc.get_attention_mask(), device)?);
    }
    Ok((Tensor::stack(&ids, 0)?, Tensor::stack(&masks, 0)?))
}
