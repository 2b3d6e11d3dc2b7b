//! Token-window chunking with overlap.
//!
//! Windows advance by `chunk_size - overlap` tokens and stop once a window
//! reaches the last token. Chunk text is the source substring from the first
//! token's start offset to the last token's end offset.

use anyhow::Result;
use std::ops::Range;
use tokenizers::Tokenizer;

use docrag_core::types::DocumentChunk;
use docrag_core::Error;

use crate::tokenize::token_spans;

pub struct TokenChunker {
    tokenizer: Tokenizer,
    chunk_size: usize,
    overlap: usize,
}

impl TokenChunker {
    /// Truncation and padding configured in `tokenizer.json` are cleared so
    /// that whole documents are tokenized.
    pub fn new(mut tokenizer: Tokenizer, chunk_size: usize, overlap: usize) -> docrag_core::Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")));
        }
        tokenizer
            .with_truncation(None)
            .map_err(|e| Error::InvalidConfig(format!("cannot disable tokenizer truncation: {e}")))?;
        tokenizer.with_padding(None);
        Ok(Self { tokenizer, chunk_size, overlap })
    }

    pub fn split_text(&self, text: &str) -> Result<Vec<String>> {
        let spans = token_spans(&self.tokenizer, text)?;
        Ok(window_ranges(spans.len(), self.chunk_size, self.overlap)
            .into_iter()
            .map(|w| slice_spans(text, &spans[w]).to_string())
            .collect())
    }

    pub fn chunk_document(&self, doc_path: &str, text: &str) -> Result<Vec<DocumentChunk>> {
        let pieces = self.split_text(text)?;
        let total_chunks = pieces.len();
        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                doc_path: doc_path.to_string(),
                content,
                chunk_index,
                total_chunks,
            })
            .collect())
    }
}

/// Token index ranges of each window over `n_tokens` tokens.
pub fn window_ranges(n_tokens: usize, chunk_size: usize, overlap: usize) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    if n_tokens == 0 || chunk_size == 0 || overlap >= chunk_size {
        return windows;
    }
    let step = chunk_size - overlap;
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(n_tokens);
        windows.push(start..end);
        if end == n_tokens {
            break;
        }
        start += step;
    }
    windows
}

fn slice_spans<'a>(text: &'a str, spans: &[(usize, usize)]) -> &'a str {
    let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
        return "";
    };
    let mut start = first.0.min(text.len());
    let mut end = last.1.max(start).min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_step_by_size_minus_overlap() {
        assert_eq!(window_ranges(1200, 500, 50), vec![0..500, 450..950, 900..1200]);
        assert_eq!(window_ranges(500, 500, 50), vec![0..500]);
        assert_eq!(window_ranges(501, 500, 50), vec![0..500, 450..501]);
        assert!(window_ranges(0, 500, 50).is_empty());
    }

    #[test]
    fn slice_snaps_to_char_boundaries() {
        let text = "héllo";
        assert_eq!(slice_spans(text, &[(0, 2)]), "hé");
        assert_eq!(slice_spans(text, &[]), "");
    }
}
