use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use pdf_extract::{Document, OutputError, PlainTextOutput};

use docrag_core::{Error, Result};

/// Text of every page in order, each page prefixed by a single space.
/// Pages without text, or that fail to decode, contribute nothing.
pub fn extract_pdf(path: &Path) -> Result<String> {
    let failed = |message: String| Error::extraction(path.display().to_string(), message);

    // pdf-extract panics on some malformed inputs
    let mut doc = panic::catch_unwind(|| Document::load(path))
        .map_err(|_| failed("PDF parser panicked".into()))?
        .map_err(|e| failed(format!("failed to load PDF: {e}")))?;
    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| failed(format!("encrypted PDF: {e}")))?;
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_num in &page_numbers {
        match page_text(&doc, *page_num) {
            Ok(text) => pages.push(text),
            Err(reason) => tracing::warn!(path = %path.display(), page = *page_num, %reason, "skipping unreadable PDF page"),
        }
    }
    if page_numbers.is_empty() {
        return Err(failed("PDF has no pages".into()));
    }
    if pages.is_empty() {
        return Err(failed(format!("none of {} pages could be read", page_numbers.len())));
    }
    Ok(join_pages(&pages))
}

fn page_text(doc: &Document, page_num: u32) -> std::result::Result<String, String> {
    let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(doc, &mut output, page_num)?;
        }
        Ok::<_, OutputError>(text)
    }));
    match rendered {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("PDF parser panicked".into()),
    }
}

fn join_pages(pages: &[String]) -> String {
    let mut content = String::new();
    for page in pages.iter().filter(|p| !p.trim().is_empty()) {
        content.push(' ');
        content.push_str(page);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::join_pages;

    #[test]
    fn blank_pages_are_dropped() {
        let pages = vec!["first".to_string(), "  \n".to_string(), "third".to_string()];
        assert_eq!(join_pages(&pages), " first third");
    }
}
