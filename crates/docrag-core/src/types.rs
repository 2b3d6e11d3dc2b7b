//! Domain types shared by extraction, indexing and query serving.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

/// File formats the extractor understands, keyed by lowercase extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Text,
    Docx,
    Pptx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "txt",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }
}

/// A discovered source file. Never mutated after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl Document {
    /// Returns `None` when the extension is not one we can extract.
    pub fn from_path(path: &Path) -> Option<Self> {
        let format = path.extension().and_then(|e| e.to_str()).and_then(DocumentFormat::from_extension)?;
        Some(Self { path: path.to_path_buf(), format })
    }

    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// A token-bounded slice of one document's text.
///
/// - `doc_path`: path of the source file; the only link back from a citation
/// - `content`: the chunk text, an exact substring of the extracted text
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub doc_path: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl DocumentChunk {
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata { path: self.doc_path.clone() }
    }
}

/// Metadata persisted next to every indexed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub path: String,
}

/// One ranked row returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Engine distance; lower is closer.
    pub distance: f32,
}

/// A search result as exposed to one query/response cycle.
///
/// `id` is the 0-based rank of the hit within this response only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: usize,
    pub path: String,
    pub content: String,
}

impl RetrievedDocument {
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map_or_else(|| self.path.clone(), |n| n.to_string_lossy().to_string())
    }

    /// Read the source file this passage came from.
    pub fn read_source(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Copy the source file into `dir`, returning the written path.
    pub fn download_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let target = dir.join(self.file_name());
        std::fs::copy(&self.path, &target)?;
        Ok(target)
    }
}

/// Body of `POST /llm_calls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Successful answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub context: Vec<RetrievedDocument>,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Decoding parameters for a single completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { temperature: 0.5, top_p: 1.0, max_tokens: 1024 }
    }
}

/// Similarity metric a collection is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Dot,
    Cosine,
    L2,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dot => "dot",
            Self::Cosine => "cosine",
            Self::L2 => "l2",
        };
        f.write_str(s)
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dot" => Ok(Self::Dot),
            "cosine" => Ok(Self::Cosine),
            "l2" | "euclid" => Ok(Self::L2),
            other => Err(Error::InvalidConfig(format!("unknown distance metric '{other}'"))),
        }
    }
}
