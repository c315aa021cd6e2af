//! Promptstore
//!
//! Storage and inference plumbing for a prompt library:
//! - Generic create/read/update/delete data access over SeaORM entities,
//!   usable from blocking and non-blocking callers through one shared
//!   query-construction core.
//! - A thin client for a local generation server (Ollama HTTP protocol)
//!   with buffered and streamed delivery of results.

pub mod services;
pub mod storage;
pub mod utils;

pub use services::llm::{AiClient, BlockingAiClient, ChatMessage, GenerateOptions, ModelInfo};
pub use storage::{BlockingRepo, Controller, DataAccess, Mode, Repo, RepoKind};
pub use utils::error::{AppError, AppResult};
