//! Inference Client Types
//!
//! Typed request options and response descriptors for the local
//! generation server's HTTP API.

use serde::{Deserialize, Serialize};

/// Default model for the embeddings endpoint
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text:latest";

/// Options for the `/api/generate` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Optional system instruction sent alongside the prompt
    pub system: Option<String>,
    pub temperature: f32,
    /// Maximum number of tokens to predict
    pub num_predict: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            system: None,
            temperature: 0.7,
            num_predict: 2048,
        }
    }
}

impl GenerateOptions {
    pub fn with_system(system: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            ..Self::default()
        }
    }
}

/// One role/content pair in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Descriptor of an installed model, as returned by `/api/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Envelope of the `/api/tags` response
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}
