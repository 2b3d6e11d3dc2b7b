//! Display state of one chat front-end session.

use std::io;
use std::path::{Path, PathBuf};

use docrag_core::citation::resolve_citations;
use docrag_core::types::{QueryResponse, RetrievedDocument};

/// One question and what came back for it.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    /// Cited documents, deduplicated, in first-citation order.
    pub citations: Vec<RetrievedDocument>,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
    downloads: usize,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the answer's citations against its own context and keep the turn.
    pub fn record(&mut self, question: impl Into<String>, response: QueryResponse) -> &ChatTurn {
        let citations = resolve_citations(&response.answer, &response.context).into_iter().cloned().collect();
        self.turns.push(ChatTurn { question: question.into(), answer: response.answer, citations });
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last_citations(&self) -> &[RetrievedDocument] {
        self.turns.last().map_or(&[], |t| t.citations.as_slice())
    }

    /// Copy the source of a document cited in the latest answer into `dir`.
    pub fn download(&mut self, id: usize, dir: &Path) -> io::Result<PathBuf> {
        let doc = self
            .last_citations()
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("document [{id}] was not cited in the last answer")))?;
        let written = doc.download_to(dir)?;
        self.downloads += 1;
        Ok(written)
    }

    pub fn download_count(&self) -> usize {
        self.downloads
    }
}
