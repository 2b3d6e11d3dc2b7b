//! Shared building blocks for the document RAG pipeline.
//!
//! Configuration merges defaults, `config.toml`, `config.<env>.toml` and the
//! environment through Figment. The collaborator traits (`Embedder`,
//! `VectorStore`, `ChatModel`) are the seams the other crates implement.

pub mod citation;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
