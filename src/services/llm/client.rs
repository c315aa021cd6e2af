//! Inference Client
//!
//! Async client for a local generation server speaking the Ollama HTTP
//! protocol. Buffered and streamed delivery share one payload-construction
//! and dispatch path; streamed responses arrive as lazy fragment sequences
//! fed through a bounded channel.
//!
//! Failure policy: the generation-family calls never let a raw network
//! error escape. Non-streaming text calls return an in-band `"Error: …"`
//! string; streaming calls end with a single in-band error fragment.
//! Administrative calls return `AppResult` carrying the cause.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};

use crate::services::llm::stream::{decode_line, embedding_fragment, DecodedLine, LineBuffer};
use crate::services::llm::types::{
    ChatMessage, GenerateOptions, ModelInfo, TagsResponse, DEFAULT_EMBEDDING_MODEL,
};
use crate::utils::error::{AppError, AppResult};
use crate::utils::time::to_seconds;

/// Default address of the local generation server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default request timeout: one day, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = to_seconds(0, 1, 0, 0);

/// Fallback text when a generate response carries no `response` field
const NO_RESPONSE: &str = "No response generated";

/// Bound on in-flight fragments between the transport and the consumer
const FRAGMENT_CAPACITY: usize = 16;

/// Client for a local generation server
pub struct AiClient {
    base_url: String,
    timeout_secs: u64,
    http: reqwest::Client,
}

impl AiClient {
    /// Client with the default one-day timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Client with an explicit request timeout in seconds.
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into(),
            timeout_secs,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Release the underlying transport.
    pub async fn close(self) {
        drop(self.http);
        debug!("HTTP client closed");
    }

    /// Run a bounded block against a temporary client and close it on
    /// exit, whether the block completes or bails early.
    ///
    /// `base_url` and `timeout_secs` default to this client's values.
    pub async fn scoped<T, F>(
        &self,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
        block: F,
    ) -> T
    where
        F: for<'c> FnOnce(&'c AiClient) -> BoxFuture<'c, T>,
    {
        let client = AiClient::with_timeout(
            base_url.unwrap_or_else(|| self.base_url.clone()),
            timeout_secs.unwrap_or(self.timeout_secs),
        );
        let out = block(&client).await;
        client.close().await;
        out
    }

    // ========================================================================
    // Generation endpoints
    // ========================================================================

    /// Buffered text generation. Returns the full response text, the
    /// fallback placeholder when the field is absent, or an in-band
    /// `"Error: …"` string on failure.
    pub async fn generate(&self, prompt: &str, model: &str, options: &GenerateOptions) -> String {
        let payload = generate_payload(prompt, model, options, false);
        self.request_text("/api/generate", payload, extract_generate)
            .await
    }

    /// Streamed text generation: a lazy, single-pass sequence of decoded
    /// fragments. Dropping the stream aborts the transfer.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
    ) -> ReceiverStream<String> {
        let payload = generate_payload(prompt, model, options, true);
        self.text_stream("/api/generate", payload).await
    }

    /// Buffered chat completion over a list of role/content messages.
    pub async fn chat(&self, messages: &[ChatMessage], model: &str) -> String {
        let payload = chat_payload(messages, model, false);
        self.request_text("/api/chat", payload, extract_chat).await
    }

    /// Streamed chat completion; same fragment contract as
    /// [`AiClient::generate_stream`].
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> ReceiverStream<String> {
        let payload = chat_payload(messages, model, true);
        self.text_stream("/api/chat", payload).await
    }

    /// Buffered embedding for a prompt. A missing `embedding` field yields
    /// an empty vector.
    pub async fn embeddings(&self, prompt: &str, model: Option<&str>) -> AppResult<Vec<f32>> {
        let payload = embeddings_payload(prompt, model, false);
        let data = self
            .request(Method::POST, "/api/embeddings", Some(&payload))
            .await?;
        Ok(embedding_fragment(&data))
    }

    /// Streamed embeddings. A transport failure arrives as a final `Err`
    /// item in the stream rather than a returned error.
    pub async fn embeddings_stream(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> ReceiverStream<AppResult<Vec<f32>>> {
        let payload = embeddings_payload(prompt, model, true);
        let (tx, rx) = mpsc::channel(FRAGMENT_CAPACITY);

        match self.open_stream("/api/embeddings", &payload).await {
            Err(cause) => {
                error!("Streaming error: {cause}");
                let _ = tx.send(Err(AppError::transport(cause))).await;
            }
            Ok(response) => {
                tokio::spawn(async move {
                    let mut body = response.bytes_stream();
                    let mut lines = LineBuffer::new();

                    while let Some(chunk) = body.next().await {
                        let chunk = match chunk {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                error!("Streaming error: {e}");
                                let _ = tx.send(Err(AppError::transport(e.to_string()))).await;
                                return;
                            }
                        };
                        for line in lines.push(&chunk) {
                            if !emit_embedding(&line, &tx).await {
                                return;
                            }
                        }
                    }
                    if let Some(line) = lines.flush() {
                        let _ = emit_embedding(&line, &tx).await;
                    }
                });
            }
        }

        ReceiverStream::new(rx)
    }

    // ========================================================================
    // Administrative endpoints
    // ========================================================================

    /// List installed models via `/api/tags`.
    pub async fn list_models(&self) -> AppResult<Vec<ModelInfo>> {
        let data = self.request(Method::GET, "/api/tags", None).await?;
        let tags: TagsResponse = serde_json::from_value(data)?;
        Ok(tags.models)
    }

    /// Pull a model by name; returns the raw decoded response body.
    pub async fn pull_model(&self, name: &str) -> AppResult<Value> {
        self.request(Method::POST, "/api/pull", Some(&json!({ "name": name })))
            .await
    }

    /// Delete a model by name; returns the raw decoded response body.
    pub async fn delete_model(&self, name: &str) -> AppResult<Value> {
        self.request(Method::DELETE, "/api/delete", Some(&json!({ "name": name })))
            .await
    }

    // ========================================================================
    // Request dispatch
    // ========================================================================

    /// Single-shot request returning the decoded JSON body. Transport
    /// failures are logged and surfaced as `AppError::Transport`.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request error at {url}: {e}");
            AppError::transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Request error at {url}: HTTP {status}");
            return Err(AppError::transport(format!("HTTP {status} for {url}")));
        }

        response.json::<Value>().await.map_err(|e| {
            error!("Unexpected error at {url}: {e}");
            AppError::transport(format!("unexpected response body: {e}"))
        })
    }

    /// Buffered variant of the generation dispatch: failures become a
    /// single in-band error-text result instead of propagating.
    async fn request_text(
        &self,
        endpoint: &str,
        payload: Value,
        extract: fn(&Value) -> String,
    ) -> String {
        match self.request(Method::POST, endpoint, Some(&payload)).await {
            Ok(data) => extract(&data),
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Open a streaming POST; on failure returns the error description for
    /// in-band delivery.
    async fn open_stream(&self, endpoint: &str, payload: &Value) -> Result<reqwest::Response, String> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status} for {url}"));
        }
        Ok(response)
    }

    /// Shared streaming dispatch for the text endpoints: decode each line,
    /// warn on malformed ones, convert a mid-stream transport failure into
    /// one final `"Error: …"` fragment.
    async fn text_stream(&self, endpoint: &str, payload: Value) -> ReceiverStream<String> {
        let (tx, rx) = mpsc::channel(FRAGMENT_CAPACITY);

        match self.open_stream(endpoint, &payload).await {
            Err(cause) => {
                error!("Streaming error: {cause}");
                let _ = tx.send(format!("Error: {cause}")).await;
            }
            Ok(response) => {
                tokio::spawn(async move {
                    let mut body = response.bytes_stream();
                    let mut lines = LineBuffer::new();

                    while let Some(chunk) = body.next().await {
                        let chunk = match chunk {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                error!("Streaming error: {e}");
                                let _ = tx.send(format!("Error: {e}")).await;
                                return;
                            }
                        };
                        for line in lines.push(&chunk) {
                            if !emit_text(&line, &tx).await {
                                return;
                            }
                        }
                    }
                    if let Some(line) = lines.flush() {
                        let _ = emit_text(&line, &tx).await;
                    }
                });
            }
        }

        ReceiverStream::new(rx)
    }
}

/// Decode one line as text and forward it; `false` when the consumer went
/// away and the transfer should stop.
async fn emit_text(line: &str, tx: &mpsc::Sender<String>) -> bool {
    match decode_line(line, false) {
        DecodedLine::Text(fragment) => tx.send(fragment).await.is_ok(),
        DecodedLine::Malformed => {
            warn!("Malformed JSON: {line}");
            true
        }
        _ => true,
    }
}

/// Embedding counterpart of [`emit_text`].
async fn emit_embedding(line: &str, tx: &mpsc::Sender<AppResult<Vec<f32>>>) -> bool {
    match decode_line(line, true) {
        DecodedLine::Embedding(fragment) => tx.send(Ok(fragment)).await.is_ok(),
        DecodedLine::Malformed => {
            warn!("Malformed JSON: {line}");
            true
        }
        _ => true,
    }
}

/// Buffered-mode extraction for `/api/generate`.
fn extract_generate(data: &Value) -> String {
    data.get("response")
        .and_then(Value::as_str)
        .unwrap_or(NO_RESPONSE)
        .to_string()
}

/// Buffered-mode extraction for `/api/chat`.
fn extract_chat(data: &Value) -> String {
    data.get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn generate_payload(prompt: &str, model: &str, options: &GenerateOptions, stream: bool) -> Value {
    let mut payload = json!({
        "model": model,
        "prompt": prompt,
        "stream": stream,
        "options": {
            "temperature": options.temperature,
            "num_predict": options.num_predict,
        },
    });
    if let Some(system) = &options.system {
        payload["system"] = json!(system);
    }
    payload
}

fn chat_payload(messages: &[ChatMessage], model: &str, stream: bool) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "stream": stream,
    })
}

fn embeddings_payload(prompt: &str, model: Option<&str>, stream: bool) -> Value {
    json!({
        "model": model.unwrap_or(DEFAULT_EMBEDDING_MODEL),
        "prompt": prompt,
        "stream": stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = AiClient::new(DEFAULT_BASE_URL);
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.timeout_secs(), 86_400);
    }

    #[test]
    fn test_generate_payload_shape() {
        let options = GenerateOptions::default();
        let payload = generate_payload("Hi", "llama3.2", &options, false);
        assert_eq!(payload["model"], "llama3.2");
        assert_eq!(payload["prompt"], "Hi");
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["options"]["num_predict"], 2048);
        assert!(payload.get("system").is_none());
    }

    #[test]
    fn test_generate_payload_with_system() {
        let options = GenerateOptions::with_system("Be terse.");
        let payload = generate_payload("Hi", "llama3.2", &options, true);
        assert_eq!(payload["system"], "Be terse.");
        assert_eq!(payload["stream"], true);
    }

    #[test]
    fn test_chat_payload_shape() {
        let messages = [ChatMessage::user("Hello")];
        let payload = chat_payload(&messages, "llama3.2", false);
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_embeddings_payload_default_model() {
        let payload = embeddings_payload("vectorize me", None, false);
        assert_eq!(payload["model"], DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_extract_generate_response_field() {
        assert_eq!(extract_generate(&json!({ "response": "hi" })), "hi");
    }

    #[test]
    fn test_extract_generate_fallback_placeholder() {
        assert_eq!(extract_generate(&json!({ "done": true })), NO_RESPONSE);
    }

    #[test]
    fn test_extract_chat_nested_content() {
        let data = json!({ "message": { "role": "assistant", "content": "bonjour" } });
        assert_eq!(extract_chat(&data), "bonjour");
        assert_eq!(extract_chat(&json!({})), "");
    }

    #[tokio::test]
    async fn test_scoped_returns_block_output_on_error_path() {
        let client = AiClient::new(DEFAULT_BASE_URL);
        let out: Result<(), String> = client
            .scoped(None, None, |_c: &AiClient| {
                Box::pin(async { Err("boom".to_string()) })
            })
            .await;
        assert_eq!(out, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_scoped_overrides_base_url() {
        let client = AiClient::new(DEFAULT_BASE_URL);
        let seen = client
            .scoped(
                Some("http://10.0.0.5:11434".to_string()),
                Some(5),
                |c: &AiClient| {
                    let url = c.base_url().to_string();
                    let timeout = c.timeout_secs();
                    Box::pin(async move { (url, timeout) })
                },
            )
            .await;
        assert_eq!(seen, ("http://10.0.0.5:11434".to_string(), 5));
    }

    // =========================================================================
    // Integration tests (require a running generation server — #[ignore])
    // =========================================================================

    #[tokio::test]
    #[ignore = "requires a running Ollama server"]
    async fn integration_generate_roundtrip() {
        let client = AiClient::new(DEFAULT_BASE_URL);
        let models = client.list_models().await.unwrap();
        assert!(!models.is_empty());

        let text = client
            .generate("Say hi in one word.", &models[0].name, &GenerateOptions::default())
            .await;
        assert!(!text.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Ollama server"]
    async fn integration_generate_stream() {
        let client = AiClient::new(DEFAULT_BASE_URL);
        let models = client.list_models().await.unwrap();
        let mut stream = client
            .generate_stream("Count to three.", &models[0].name, &GenerateOptions::default())
            .await;

        let mut fragments = Vec::new();
        while let Some(fragment) = stream.next().await {
            fragments.push(fragment);
        }
        assert!(!fragments.is_empty());
    }
}
