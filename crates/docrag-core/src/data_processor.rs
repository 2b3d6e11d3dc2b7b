//! File discovery and the per-file outcome report of an indexing run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Indexed { chunks: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn indexed(path: impl Into<PathBuf>, chunks: usize) -> Self {
        Self { path: path.into(), status: FileStatus::Indexed { chunks } }
    }

    pub fn skipped(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), status: FileStatus::Skipped { reason: reason.into() } }
    }

    pub fn failed(path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        Self { path: path.into(), status: FileStatus::Failed { error: error.to_string() } }
    }
}

/// Result of one full indexing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Physical collection the run wrote to.
    pub collection: String,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), outcomes: Vec::new() }
    }

    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn files_indexed(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, FileStatus::Indexed { .. })).count()
    }

    pub fn files_skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, FileStatus::Skipped { .. })).count()
    }

    pub fn files_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, FileStatus::Failed { .. })).count()
    }

    pub fn total_chunks(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                FileStatus::Indexed { chunks } => chunks,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| matches!(o.status, FileStatus::Failed { .. }))
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files indexed into {} chunks ({} skipped, {} failed) -> {}",
            self.files_indexed(),
            self.total_chunks(),
            self.files_skipped(),
            self.files_failed(),
            self.collection
        )
    }
}

/// Files found under a root, plus entries that could not be visited.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Every regular file, sorted by path.
    pub files: Vec<PathBuf>,
    /// Unreadable entries and symlink loops.
    pub errors: Vec<FileOutcome>,
}

/// Walk `root` depth-first, following symlinks. Walk errors never abort;
/// they are returned as failed outcomes.
pub fn discover_files(root: &Path) -> Result<Discovery> {
    if !root.exists() {
        return Err(Error::NotFound(format!("data directory {}", root.display())));
    }
    let mut discovery = Discovery::default();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => discovery.files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => {
                let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                discovery.errors.push(FileOutcome::failed(path, err));
            }
        }
    }
    discovery.files.sort();
    Ok(discovery)
}
