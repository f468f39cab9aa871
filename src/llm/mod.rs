//! LLM Backend Module
//!
//! Provides a unified interface for the inference service behind triage,
//! resolution and escalation judgment.
//!
//! ## Architecture
//!
//! - **LlmBackend**: async trait returning the raw completion text
//! - **OpenAiCompatBackend**: `reqwest` client for any OpenAI-compatible
//!   `/chat/completions` endpoint (Groq by default)
//! - **parsing**: isolates and deserializes the JSON object inside a completion
//! - **prompts**: system and user prompts per collaborator

use async_trait::async_trait;

mod openai_compat;
pub mod parsing;
pub mod prompts;

pub use openai_compat::OpenAiCompatBackend;

/// One chat completion request: a system prompt plus a single user turn
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    /// Ask the server to constrain output to a JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn json(system: &str, user: String, temperature: f64) -> Self {
        Self {
            system: system.to_string(),
            user,
            temperature,
            json_mode: true,
        }
    }
}

/// Inference transport errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("completion contained no message content")]
    EmptyCompletion,

    #[error("no API key configured (set LLM_API_KEY or GROQ_API_KEY)")]
    MissingApiKey,
}

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run a completion and return the assistant message text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}
