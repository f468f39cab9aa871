//! Collaborator contracts consumed by the pipeline stages.
//!
//! The classifier, search backend, generator and judge are external services
//! (normally an LLM endpoint and a document index). Each is reached through an
//! async trait so the orchestrator can be driven by real backends in
//! production and by in-process fakes in tests.
//!
//! Structured-output failures are values, not errors: a classifier or
//! generator that answered but could not be understood returns
//! [`StructuredReply::Unparseable`] and the stage applies its fallback.
//! [`CollaboratorError`] is reserved for "the service could not be used".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Category, Priority, RetrievedDoc};

mod llm_backed;

pub use llm_backed::{LlmClassifier, LlmGenerator, LlmJudge};

// ============================================================================
// Reply types
// ============================================================================

/// Either a schema-valid reply or the raw text that failed validation
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredReply<T> {
    Parsed(T),
    Unparseable { raw: String, reason: String },
}

impl<T> StructuredReply<T> {
    pub fn unparseable(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unparseable {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triage {
    pub category: Category,
    pub priority: Priority,
    pub keywords: Vec<String>,
}

/// Generator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub response: String,
    pub confidence: f64,
}

/// Judge output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub escalate: bool,
    pub reason: String,
}

/// Everything the generator needs to draft an answer
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub content: String,
    /// Formatted retrieval context, possibly empty
    pub context: String,
    pub category: Category,
    pub priority: Priority,
}

// ============================================================================
// Errors
// ============================================================================

/// A collaborator could not be used for this ticket
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: &'static str,
        reason: String,
    },

    #[error("{collaborator} returned malformed output: {reason}")]
    Malformed {
        collaborator: &'static str,
        reason: String,
    },
}

impl CollaboratorError {
    pub fn unavailable(collaborator: &'static str, reason: impl ToString) -> Self {
        Self::Unavailable {
            collaborator,
            reason: reason.to_string(),
        }
    }

    pub fn malformed(collaborator: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            collaborator,
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Assigns category, priority and search keywords to raw ticket text
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<StructuredReply<Triage>, CollaboratorError>;
}

/// Ranked documentation search
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Return at most `top_k` documents, most relevant first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDoc>, CollaboratorError>;

    /// Get the backend name for logging and health checks
    fn backend_name(&self) -> &'static str;
}

/// Drafts a customer-facing answer with a self-assessed confidence
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<StructuredReply<Resolution>, CollaboratorError>;
}

/// Final escalation call for tickets no deterministic rule caught.
///
/// Any failure, unreachable or malformed, is an `Err`; the escalation
/// policy converts it into an escalation.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(
        &self,
        content: &str,
        category: Category,
        confidence: f64,
    ) -> Result<Judgment, CollaboratorError>;
}
