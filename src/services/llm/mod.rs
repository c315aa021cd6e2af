//! Local Inference Client
//!
//! Thin client for a local generation server speaking the Ollama HTTP
//! protocol: text generation, chat, and embeddings with buffered or
//! streamed delivery, plus model administration.

pub mod blocking;
pub mod client;
mod stream;
pub mod types;

pub use blocking::{BlockingAiClient, Fragments};
pub use client::{AiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use types::{ChatMessage, GenerateOptions, ModelInfo, DEFAULT_EMBEDDING_MODEL};
