use docrag_core::types::{ChatMessage, RetrievedDocument};

pub const SYSTEM_INSTRUCTION: &str = "You are an assistant that answers questions strictly from the \
context documents provided. Every document is preceded by its ID. Always cite the ID of each document \
you use in square brackets, for example [0] or [1], using as many citations as needed. If the documents \
do not contain the answer, say so.";

/// `"{id}\n{content}\n\n"` per document, in rank order.
pub fn build_context(docs: &[RetrievedDocument]) -> String {
    docs.iter().map(|d| format!("{}\n{}\n\n", d.id, d.content)).collect()
}

pub fn build_messages(context: &str, query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(format!("Documents:\n{context}\n\nQuestion: {query}")),
    ]
}
