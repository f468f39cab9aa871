//! Escalation policy: decides whether a human must take the ticket.
//!
//! Rules are evaluated in order and the first one that fires wins:
//!
//! 1. `confidence < ESCALATION_CONFIDENCE_THRESHOLD` escalates, for every category.
//! 2. `billing` escalates.
//! 3. Otherwise the judge collaborator decides.
//! 4. If the judge is unreachable or its reply is unusable, escalate.
//!
//! The judge is only ever called for tickets that passed rules 1 and 2.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::collaborators::Judge;
use crate::config::defaults::{BILLING_ESCALATION_REASON, ESCALATION_CONFIDENCE_THRESHOLD};
use crate::types::{Category, RecoveredError};

/// Which rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationRule {
    LowConfidence,
    Billing,
    Judgment,
    JudgmentFailure,
}

/// Fields owned by escalation
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationDecision {
    pub escalate: bool,
    pub reason: String,
    pub rule: EscalationRule,
    /// Set when the judge failed and the fail-safe applied
    pub judgment_error: Option<RecoveredError>,
}

impl EscalationDecision {
    fn fired(rule: EscalationRule, reason: String) -> Self {
        Self {
            escalate: true,
            reason,
            rule,
            judgment_error: None,
        }
    }
}

pub struct EscalationPolicy {
    judge: Arc<dyn Judge>,
}

impl EscalationPolicy {
    pub fn new(judge: Arc<dyn Judge>) -> Self {
        Self { judge }
    }

    /// Rules 1 and 2. `None` means the judge must decide.
    pub fn deterministic_rule(category: Category, confidence: f64) -> Option<EscalationDecision> {
        // NaN compares false, so check it explicitly to keep it on the safe side
        if confidence.is_nan() || confidence < ESCALATION_CONFIDENCE_THRESHOLD {
            return Some(EscalationDecision::fired(
                EscalationRule::LowConfidence,
                format!("Low confidence ({confidence} < {ESCALATION_CONFIDENCE_THRESHOLD})"),
            ));
        }
        if category == Category::Billing {
            return Some(EscalationDecision::fired(
                EscalationRule::Billing,
                BILLING_ESCALATION_REASON.to_string(),
            ));
        }
        None
    }

    /// Full rule chain. Never fails: judge errors become escalations.
    pub async fn decide(&self, content: &str, category: Category, confidence: f64) -> EscalationDecision {
        if let Some(decision) = Self::deterministic_rule(category, confidence) {
            debug!(rule = ?decision.rule, "Escalation rule fired");
            return decision;
        }

        match self.judge.judge(content, category, confidence).await {
            Ok(judgment) => {
                debug!(escalate = judgment.escalate, "Judge decided");
                EscalationDecision {
                    escalate: judgment.escalate,
                    reason: judgment.reason,
                    rule: EscalationRule::Judgment,
                    judgment_error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Escalation judgment failed, escalating");
                let reason = e.to_string();
                EscalationDecision {
                    escalate: true,
                    reason: format!("Error in escalation logic: {reason}"),
                    rule: EscalationRule::JudgmentFailure,
                    judgment_error: Some(RecoveredError::JudgmentFailure { reason }),
                }
            }
        }
    }
}
