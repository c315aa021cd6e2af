//! Blocking Client Adapter
//!
//! Drives the async [`AiClient`] to completion from a blocking caller.
//! Owns a tokio runtime for the client's lifetime; every operation mirrors
//! its async counterpart with identical semantics, and streaming variants
//! hand back an [`Iterator`] over the same fragments.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::services::llm::client::AiClient;
use crate::services::llm::types::{ChatMessage, GenerateOptions, ModelInfo};
use crate::utils::error::AppResult;

/// Blocking adapter over [`AiClient`]
pub struct BlockingAiClient {
    runtime: tokio::runtime::Runtime,
    inner: AiClient,
}

impl BlockingAiClient {
    /// Blocking client with the default one-day timeout.
    ///
    /// Must not be constructed from within an async context.
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            inner: AiClient::new(base_url),
        })
    }

    /// Blocking client with an explicit request timeout in seconds.
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            inner: AiClient::with_timeout(base_url, timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    /// Release the underlying transport and runtime.
    pub fn close(self) {
        self.runtime.block_on(self.inner.close());
    }

    pub fn generate(&self, prompt: &str, model: &str, options: &GenerateOptions) -> String {
        self.runtime
            .block_on(self.inner.generate(prompt, model, options))
    }

    /// Streamed generation as a blocking fragment iterator.
    pub fn generate_stream(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
    ) -> Fragments<String> {
        let stream = self
            .runtime
            .block_on(self.inner.generate_stream(prompt, model, options));
        Fragments::from_stream(stream)
    }

    pub fn chat(&self, messages: &[ChatMessage], model: &str) -> String {
        self.runtime.block_on(self.inner.chat(messages, model))
    }

    pub fn chat_stream(&self, messages: &[ChatMessage], model: &str) -> Fragments<String> {
        let stream = self.runtime.block_on(self.inner.chat_stream(messages, model));
        Fragments::from_stream(stream)
    }

    pub fn embeddings(&self, prompt: &str, model: Option<&str>) -> AppResult<Vec<f32>> {
        self.runtime.block_on(self.inner.embeddings(prompt, model))
    }

    pub fn embeddings_stream(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Fragments<AppResult<Vec<f32>>> {
        let stream = self
            .runtime
            .block_on(self.inner.embeddings_stream(prompt, model));
        Fragments::from_stream(stream)
    }

    pub fn list_models(&self) -> AppResult<Vec<ModelInfo>> {
        self.runtime.block_on(self.inner.list_models())
    }

    pub fn pull_model(&self, name: &str) -> AppResult<Value> {
        self.runtime.block_on(self.inner.pull_model(name))
    }

    pub fn delete_model(&self, name: &str) -> AppResult<Value> {
        self.runtime.block_on(self.inner.delete_model(name))
    }
}

/// Blocking iterator over streamed fragments.
///
/// Dropping it early simply stops iteration and aborts the transfer.
pub struct Fragments<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Fragments<T> {
    fn from_stream(stream: ReceiverStream<T>) -> Self {
        Self {
            rx: stream.into_inner(),
        }
    }
}

impl<T> Iterator for Fragments<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.rx.blocking_recv()
    }
}
