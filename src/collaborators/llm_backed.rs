//! Classifier, generator and judge implemented over an [`LlmBackend`].
//!
//! Each collaborator sends its system prompt, parses the first JSON object in
//! the completion into a wire struct, and validates it into the typed reply.
//! Transport failures map to [`CollaboratorError::Unavailable`].

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{
    Classifier, CollaboratorError, GenerationRequest, Generator, Judge, Judgment, Resolution,
    StructuredReply, Triage,
};
use crate::config::defaults::MAX_KEYWORDS;
use crate::llm::parsing::parse_structured;
use crate::llm::{prompts, CompletionRequest, LlmBackend};
use crate::types::{Category, Priority};

const CLASSIFIER: &str = "classifier";
const GENERATOR: &str = "generator";
const JUDGE: &str = "judge";

// ============================================================================
// Wire schemas
// ============================================================================

#[derive(Debug, Deserialize)]
struct TriageWire {
    category: String,
    priority: String,
    keywords: Vec<String>,
}

impl TriageWire {
    fn validate(self) -> Result<Triage, String> {
        let category = self
            .category
            .parse::<Category>()
            .map_err(|e| e.to_string())?;
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|e| e.to_string())?;
        let keywords: Vec<String> = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        if keywords.is_empty() {
            return Err("keywords must contain at least one term".to_string());
        }
        Ok(Triage {
            category,
            priority,
            keywords,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResolutionWire {
    response: String,
    confidence: f64,
}

impl ResolutionWire {
    fn validate(self) -> Result<Resolution, String> {
        if self.response.trim().is_empty() {
            return Err("response is empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} is outside [0, 1]", self.confidence));
        }
        Ok(Resolution {
            response: self.response,
            confidence: self.confidence,
        })
    }
}

#[derive(Debug, Deserialize)]
struct JudgmentWire {
    escalate: bool,
    #[serde(default)]
    reason: String,
}

impl JudgmentWire {
    fn into_judgment(self) -> Judgment {
        let reason = if self.reason.trim().is_empty() {
            "No reason provided".to_string()
        } else {
            self.reason
        };
        Judgment {
            escalate: self.escalate,
            reason,
        }
    }
}

fn validated<W, T>(raw: String, validate: impl FnOnce(W) -> Result<T, String>) -> StructuredReply<T>
where
    W: serde::de::DeserializeOwned,
{
    match parse_structured::<W>(&raw).and_then(validate) {
        Ok(value) => StructuredReply::Parsed(value),
        Err(reason) => StructuredReply::Unparseable { raw, reason },
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Triage over an LLM backend
pub struct LlmClassifier {
    backend: Arc<dyn LlmBackend>,
    temperature: f64,
}

impl LlmClassifier {
    pub fn new(backend: Arc<dyn LlmBackend>, temperature: f64) -> Self {
        Self {
            backend,
            temperature,
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<StructuredReply<Triage>, CollaboratorError> {
        let request = CompletionRequest::json(
            prompts::TRIAGE_SYSTEM_PROMPT,
            prompts::triage_user_prompt(text),
            self.temperature,
        );
        let raw = self
            .backend
            .complete(&request)
            .await
            .map_err(|e| CollaboratorError::unavailable(CLASSIFIER, e))?;
        debug!(backend = self.backend.backend_name(), "Classifier completion received");
        Ok(validated(raw, TriageWire::validate))
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Resolution drafting over an LLM backend
pub struct LlmGenerator {
    backend: Arc<dyn LlmBackend>,
    temperature: f64,
}

impl LlmGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>, temperature: f64) -> Self {
        Self {
            backend,
            temperature,
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<StructuredReply<Resolution>, CollaboratorError> {
        let completion = CompletionRequest::json(
            prompts::RESOLUTION_SYSTEM_PROMPT,
            prompts::resolution_user_prompt(
                &request.content,
                &request.context,
                request.category,
                request.priority,
            ),
            self.temperature,
        );
        let raw = self
            .backend
            .complete(&completion)
            .await
            .map_err(|e| CollaboratorError::unavailable(GENERATOR, e))?;
        Ok(validated(raw, ResolutionWire::validate))
    }
}

// ============================================================================
// Judge
// ============================================================================

/// Escalation judgment over an LLM backend
pub struct LlmJudge {
    backend: Arc<dyn LlmBackend>,
    temperature: f64,
}

impl LlmJudge {
    pub fn new(backend: Arc<dyn LlmBackend>, temperature: f64) -> Self {
        Self {
            backend,
            temperature,
        }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn judge(
        &self,
        content: &str,
        category: Category,
        confidence: f64,
    ) -> Result<Judgment, CollaboratorError> {
        let request = CompletionRequest::json(
            prompts::ESCALATION_SYSTEM_PROMPT,
            prompts::escalation_user_prompt(content, category, confidence),
            self.temperature,
        );
        let raw = self
            .backend
            .complete(&request)
            .await
            .map_err(|e| CollaboratorError::unavailable(JUDGE, e))?;
        parse_structured::<JudgmentWire>(&raw)
            .map(JudgmentWire::into_judgment)
            .map_err(|reason| CollaboratorError::malformed(JUDGE, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    /// Backend that always answers with the same text or error
    struct Scripted(Result<String, LlmError>);

    #[async_trait]
    impl LlmBackend for Scripted {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            self.0.clone()
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn backend(reply: &str) -> Arc<dyn LlmBackend> {
        Arc::new(Scripted(Ok(reply.to_string())))
    }

    fn failing() -> Arc<dyn LlmBackend> {
        Arc::new(Scripted(Err(LlmError::Timeout(30))))
    }

    fn generation_request() -> GenerationRequest {
        GenerationRequest {
            content: "How do I reset my password?".to_string(),
            context: String::new(),
            category: Category::Technical,
            priority: Priority::Medium,
        }
    }

    #[tokio::test]
    async fn test_classifier_parses_fenced_json() {
        let reply = "```json\n{\"category\": \"Technical\", \"priority\": \"high\", \"keywords\": [\"login\", \"password\"]}\n```";
        let classifier = LlmClassifier::new(backend(reply), 0.1);
        let triage = classifier.classify("I can't log in").await.unwrap();
        assert_eq!(
            triage,
            StructuredReply::Parsed(Triage {
                category: Category::Technical,
                priority: Priority::High,
                keywords: vec!["login".to_string(), "password".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn test_classifier_truncates_keywords() {
        let reply = r#"{"category":"general","priority":"low","keywords":["a","b","c","d","e","f","g"]}"#;
        let classifier = LlmClassifier::new(backend(reply), 0.1);
        match classifier.classify("hi").await.unwrap() {
            StructuredReply::Parsed(t) => assert_eq!(t.keywords.len(), MAX_KEYWORDS),
            other => panic!("expected parsed triage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_classifier_rejects_unknown_category() {
        let reply = r#"{"category":"refunds","priority":"low","keywords":["refund"]}"#;
        let classifier = LlmClassifier::new(backend(reply), 0.1);
        let result = classifier.classify("refund me").await.unwrap();
        assert!(matches!(
            result,
            StructuredReply::Unparseable { ref reason, .. } if reason.contains("refunds")
        ));
    }

    #[tokio::test]
    async fn test_classifier_rejects_blank_keywords() {
        let reply = r#"{"category":"general","priority":"low","keywords":["  "]}"#;
        let classifier = LlmClassifier::new(backend(reply), 0.1);
        assert!(!classifier.classify("hello").await.unwrap().is_parsed());
    }

    #[tokio::test]
    async fn test_classifier_transport_failure_is_error() {
        let classifier = LlmClassifier::new(failing(), 0.1);
        let err = classifier.classify("hello").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable { collaborator: "classifier", .. }));
    }

    #[tokio::test]
    async fn test_generator_keeps_raw_text_when_unparseable() {
        let generator = LlmGenerator::new(backend("Sorry, something broke"), 0.3);
        let reply = generator.generate(&generation_request()).await.unwrap();
        match reply {
            StructuredReply::Unparseable { raw, .. } => assert_eq!(raw, "Sorry, something broke"),
            other => panic!("expected unparseable reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generator_rejects_out_of_range_confidence() {
        let generator = LlmGenerator::new(backend(r#"{"response":"ok","confidence":1.4}"#), 0.3);
        let reply = generator.generate(&generation_request()).await.unwrap();
        assert!(!reply.is_parsed());
    }

    #[tokio::test]
    async fn test_generator_parses_valid_reply() {
        let generator =
            LlmGenerator::new(backend(r#"{"response":"Use the reset link.","confidence":0.85}"#), 0.3);
        let reply = generator.generate(&generation_request()).await.unwrap();
        assert_eq!(
            reply,
            StructuredReply::Parsed(Resolution {
                response: "Use the reset link.".to_string(),
                confidence: 0.85,
            })
        );
    }

    #[tokio::test]
    async fn test_judge_malformed_reply_is_error() {
        let judge = LlmJudge::new(backend("I think maybe?"), 0.0);
        let err = judge.judge("help", Category::General, 0.9).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Malformed { collaborator: "judge", .. }));
    }

    #[tokio::test]
    async fn test_judge_fills_missing_reason() {
        let judge = LlmJudge::new(backend(r#"{"escalate": false}"#), 0.0);
        let judgment = judge.judge("help", Category::General, 0.9).await.unwrap();
        assert!(!judgment.escalate);
        assert_eq!(judgment.reason, "No reason provided");
    }
}
