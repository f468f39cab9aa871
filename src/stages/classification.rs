//! Classification stage: category, priority and search keywords.

use std::sync::Arc;
use tracing::{debug, warn};

use super::StageError;
use crate::collaborators::{Classifier, StructuredReply, Triage};
use crate::config::defaults::{FALLBACK_KEYWORDS, MAX_KEYWORDS};
use crate::types::{Category, Priority, RecoveredError};

/// Fields owned by classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutput {
    pub category: Category,
    pub priority: Priority,
    pub keywords: Vec<String>,
    /// Set when the classifier reply failed validation and the fallback was used
    pub parse_error: Option<RecoveredError>,
}

impl ClassificationOutput {
    /// Deterministic fallback: general / medium / [support, help]
    pub fn fallback(reason: String) -> Self {
        Self {
            category: Category::General,
            priority: Priority::Medium,
            keywords: FALLBACK_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
            parse_error: Some(RecoveredError::ClassificationParse { reason }),
        }
    }
}

impl TryFrom<Triage> for ClassificationOutput {
    type Error = String;

    /// Parsed replies still have to carry at least one usable keyword.
    fn try_from(t: Triage) -> Result<Self, Self::Error> {
        let keywords: Vec<String> = t
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        if keywords.is_empty() {
            return Err("keywords must contain at least one term".to_string());
        }
        Ok(Self {
            category: t.category,
            priority: t.priority,
            keywords,
            parse_error: None,
        })
    }
}

pub struct ClassificationStage {
    classifier: Arc<dyn Classifier>,
}

impl ClassificationStage {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub async fn run(&self, content: &str) -> Result<ClassificationOutput, StageError> {
        if content.trim().is_empty() {
            return Err(StageError::InvalidInput("ticket content is empty".to_string()));
        }

        match self.classifier.classify(content).await? {
            StructuredReply::Parsed(triage) => match ClassificationOutput::try_from(triage) {
                Ok(out) => {
                    debug!(
                        category = %out.category,
                        priority = %out.priority,
                        keywords = ?out.keywords,
                        "Ticket classified"
                    );
                    Ok(out)
                }
                Err(reason) => {
                    warn!(%reason, "Classifier reply failed validation, using fallback");
                    Ok(ClassificationOutput::fallback(reason))
                }
            },
            StructuredReply::Unparseable { raw, reason } => {
                warn!(%reason, raw_len = raw.len(), "Classifier output unparseable, using fallback");
                Ok(ClassificationOutput::fallback(reason))
            }
        }
    }
}
