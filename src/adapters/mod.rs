// Adapters layer: concrete implementations of the domain ports (HTTP model
// clients, retrieval, post sources, notifiers).

pub mod embeddings;
pub mod http;
pub mod llm;
pub mod notify;
pub mod retrieval;
pub mod source;
