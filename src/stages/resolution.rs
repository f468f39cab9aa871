//! Resolution stage: customer-facing answer plus confidence.

use std::sync::Arc;
use tracing::{debug, warn};

use super::StageError;
use crate::collaborators::{GenerationRequest, Generator, Resolution, StructuredReply};
use crate::config::defaults::{EMPTY_RESPONSE_FALLBACK, FALLBACK_CONFIDENCE, NO_DOCUMENTATION_CONTEXT};
use crate::types::{Category, Priority, RecoveredError};

/// Fields owned by resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutput {
    /// Never empty
    pub response: String,
    /// In [0, 1]
    pub confidence: f64,
    pub parse_error: Option<RecoveredError>,
}

impl ResolutionOutput {
    /// Raw generator text with the fixed fallback confidence
    pub fn fallback(raw: String, reason: String) -> Self {
        let response = if raw.trim().is_empty() {
            EMPTY_RESPONSE_FALLBACK.to_string()
        } else {
            raw
        };
        Self {
            response,
            confidence: FALLBACK_CONFIDENCE,
            parse_error: Some(RecoveredError::ResolutionParse { reason }),
        }
    }
}

impl TryFrom<Resolution> for ResolutionOutput {
    type Error = (String, String);

    /// On failure returns the response text and the rejection reason.
    fn try_from(r: Resolution) -> Result<Self, Self::Error> {
        if r.response.trim().is_empty() {
            return Err((r.response, "response is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&r.confidence) {
            let reason = format!("confidence {} is outside [0, 1]", r.confidence);
            return Err((r.response, reason));
        }
        Ok(Self {
            response: r.response,
            confidence: r.confidence,
            parse_error: None,
        })
    }
}

pub struct ResolutionStage {
    generator: Arc<dyn Generator>,
}

impl ResolutionStage {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn run(
        &self,
        content: &str,
        context: &str,
        category: Category,
        priority: Priority,
    ) -> Result<ResolutionOutput, StageError> {
        let context = if context.is_empty() {
            NO_DOCUMENTATION_CONTEXT
        } else {
            context
        };
        let request = GenerationRequest {
            content: content.to_string(),
            context: context.to_string(),
            category,
            priority,
        };

        match self.generator.generate(&request).await? {
            StructuredReply::Parsed(resolution) => match ResolutionOutput::try_from(resolution) {
                Ok(out) => {
                    debug!(confidence = out.confidence, "Resolution generated");
                    Ok(out)
                }
                Err((raw, reason)) => {
                    warn!(%reason, "Generator reply failed validation, using fallback");
                    Ok(ResolutionOutput::fallback(raw, reason))
                }
            },
            StructuredReply::Unparseable { raw, reason } => {
                warn!(%reason, "Generator output unparseable, using raw text");
                Ok(ResolutionOutput::fallback(raw, reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedGenerator {
        reply: Result<StructuredReply<Resolution>, CollaboratorError>,
        seen_context: Mutex<Option<String>>,
    }

    impl FixedGenerator {
        fn new(reply: Result<StructuredReply<Resolution>, CollaboratorError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen_context: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<StructuredReply<Resolution>, CollaboratorError> {
            *self.seen_context.lock().unwrap() = Some(request.context.clone());
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_unparseable_output_becomes_response() {
        let generator = FixedGenerator::new(Ok(StructuredReply::unparseable(
            "Sorry, something broke",
            "no JSON object found",
        )));
        let out = ResolutionStage::new(generator)
            .run("help", "", Category::General, Priority::Low)
            .await
            .unwrap();
        assert_eq!(out.response, "Sorry, something broke");
        assert!((out.confidence - 0.5).abs() < f64::EPSILON);
        assert!(matches!(out.parse_error, Some(RecoveredError::ResolutionParse { .. })));
    }

    #[tokio::test]
    async fn test_blank_unparseable_output_still_yields_response() {
        let generator = FixedGenerator::new(Ok(StructuredReply::unparseable("  ", "empty completion")));
        let out = ResolutionStage::new(generator)
            .run("help", "", Category::General, Priority::Low)
            .await
            .unwrap();
        assert_eq!(out.response, EMPTY_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn test_empty_context_is_described_to_generator() {
        let generator = FixedGenerator::new(Ok(StructuredReply::Parsed(Resolution {
            response: "ok".into(),
            confidence: 0.9,
        })));
        let stage = ResolutionStage::new(generator.clone());
        let out = stage.run("help", "", Category::General, Priority::Low).await.unwrap();
        assert!(out.parse_error.is_none());
        assert_eq!(
            generator.seen_context.lock().unwrap().as_deref(),
            Some(NO_DOCUMENTATION_CONTEXT)
        );
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_uses_fallback() {
        for confidence in [1.5, -0.1, f64::NAN, f64::INFINITY] {
            let generator = FixedGenerator::new(Ok(StructuredReply::Parsed(Resolution {
                response: "Try resetting your password".into(),
                confidence,
            })));
            let out = ResolutionStage::new(generator)
                .run("help", "ctx", Category::Technical, Priority::High)
                .await
                .unwrap();
            assert_eq!(out.response, "Try resetting your password");
            assert!((out.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
            assert!(matches!(out.parse_error, Some(RecoveredError::ResolutionParse { .. })));
        }
    }

    #[tokio::test]
    async fn test_parsed_blank_response_uses_fallback_text() {
        let generator = FixedGenerator::new(Ok(StructuredReply::Parsed(Resolution {
            response: " ".into(),
            confidence: 0.9,
        })));
        let out = ResolutionStage::new(generator)
            .run("help", "ctx", Category::General, Priority::Low)
            .await
            .unwrap();
        assert_eq!(out.response, EMPTY_RESPONSE_FALLBACK);
        assert!((out.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_unavailable_generator_is_fatal() {
        let generator = FixedGenerator::new(Err(CollaboratorError::unavailable("generator", "503")));
        let result = ResolutionStage::new(generator)
            .run("help", "ctx", Category::Technical, Priority::High)
            .await;
        assert!(matches!(result, Err(StageError::Collaborator(_))));
    }
}
