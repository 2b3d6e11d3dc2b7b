use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use std::collections::HashMap;
use std::path::Path;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::Tokenizer;

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

/// Word-level tokenizer splitting on whitespace and punctuation runs, with
/// every word mapped to `[UNK]`. Used when no `tokenizer.json` is available
/// and the fake embedder is active.
pub fn whitespace_tokenizer() -> Result<Tokenizer> {
    let vocab: HashMap<String, u32> = [("[UNK]".to_string(), 0)].into_iter().collect();
    let model = WordLevel::builder()
        .vocab(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| anyhow!("Failed to build word-level tokenizer: {}", e))?;
    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(Whitespace {}));
    Ok(tokenizer)
}

/// Byte offsets of every token in `text`, special tokens excluded.
pub fn token_spans(tokenizer: &Tokenizer, text: &str) -> Result<Vec<(usize, usize)>> {
    let enc = tokenizer.encode(text, false).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    Ok(enc.get_offsets().to_vec())
}

/// Model inputs for a batch, padded to the longest sequence.
pub struct BatchInputs {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<BatchInputs> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut type_ids = enc.get_type_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        type_ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, type_ids, mask));
    }

    let width = rows.iter().map(|(ids, _, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut ids_flat = Vec::with_capacity(rows.len() * width);
    let mut types_flat = Vec::with_capacity(rows.len() * width);
    let mut mask_flat = Vec::with_capacity(rows.len() * width);
    for (ids, type_ids, mask) in rows {
        let pad = width - ids.len();
        ids_flat.extend(ids.into_iter().chain(std::iter::repeat(pad_id).take(pad)));
        types_flat.extend(type_ids.into_iter().chain(std::iter::repeat(0).take(pad)));
        mask_flat.extend(mask.into_iter().chain(std::iter::repeat(0).take(pad)));
    }

    let shape = (texts.len(), width);
    Ok(BatchInputs {
        input_ids: Tensor::from_vec(ids_flat, shape, device)?,
        token_type_ids: Tensor::from_vec(types_flat, shape, device)?,
        attention_mask: Tensor::from_vec(mask_flat, shape, device)?,
    })
}
