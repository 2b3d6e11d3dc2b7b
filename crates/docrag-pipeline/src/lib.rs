//! Indexing and question answering on top of the extract, embed and vector
//! crates, plus the HTTP client and session state used by the chat front end.

pub mod answerer;
pub mod api_client;
pub mod indexer;
pub mod llm;
pub mod prompt;
pub mod session;

pub use answerer::{Answerer, StageTimeouts};
pub use api_client::QueryClient;
pub use indexer::{IndexOptions, Indexer};
pub use llm::{chat_model_from_settings, DisabledChatModel, OpenAiChatModel, NOT_CONFIGURED_ANSWER};
pub use session::{ChatSession, ChatTurn};
