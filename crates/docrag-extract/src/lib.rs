//! Format-specific text extraction: file path in, raw text out.
//!
//! Office formats are read as ZIP archives and their XML parts streamed
//! with quick-xml. PDFs go through pdf-extract.

mod docx;
mod ooxml;
mod pdf;
mod pptx;
mod text;

use std::path::Path;

use docrag_core::types::{Document, DocumentFormat};
use docrag_core::{Error, Result};

pub use docx::extract_docx;
pub use pdf::extract_pdf;
pub use pptx::extract_pptx;
pub use text::extract_text;

/// Default cap on input size (50 MiB).
pub const MAX_DOC_SIZE: u64 = 50 * 1024 * 1024;

/// Extract the full text of a discovered document.
pub fn extract(document: &Document, max_bytes: u64) -> Result<String> {
    let path = document.path.as_path();
    check_file_size(path, max_bytes)?;
    tracing::debug!(path = %path.display(), format = document.format.extension(), "extracting");
    match document.format {
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Text => extract_text(path),
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Pptx => extract_pptx(path),
    }
}

/// Like [`extract`], but starts from a bare path. Unknown extensions are
/// reported as `UnsupportedFormat`.
pub fn extract_path(path: &Path, max_bytes: u64) -> Result<String> {
    let document =
        Document::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    extract(&document, max_bytes)
}

fn check_file_size(path: &Path, max_bytes: u64) -> Result<u64> {
    let size = std::fs::metadata(path)
        .map_err(|e| Error::extraction(path.display().to_string(), format!("failed to read file metadata: {e}")))?
        .len();
    if size > max_bytes {
        #[allow(clippy::cast_precision_loss)]
        let mb = |b: u64| b as f64 / (1024.0 * 1024.0);
        return Err(Error::extraction(
            path.display().to_string(),
            format!("file too large: {:.1} MB (max {:.1} MB)", mb(size), mb(max_bytes)),
        ));
    }
    Ok(size)
}
