//! Ticket state: the record threaded through the pipeline.
//!
//! Every field other than `ticket_id` and `content` lives in a [`WriteOnce`]
//! slot. A second write to any slot fails with [`StateError::AlreadySet`]
//! instead of silently overwriting an earlier stage's output, and every
//! successful write is appended to the state's write log.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Category / Priority
// ============================================================================

/// Ticket category assigned by triage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Billing,
    General,
    FeatureRequest,
}

impl Category {
    pub const ALL: [Self; 4] = [
        Self::Technical,
        Self::Billing,
        Self::General,
        Self::FeatureRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Billing => "billing",
            Category::General => "general",
            Category::FeatureRequest => "feature_request",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    /// Case-insensitive; accepts `feature_request`, `feature-request` and
    /// `feature request`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}

/// Ticket priority assigned by triage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| UnknownVariant::new("priority", s))
    }
}

/// A string that names no known category or priority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Retrieved documentation
// ============================================================================

/// One ranked search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDoc {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Relevance in [0, 1]
    pub score: f64,
}

// ============================================================================
// Write-once slots
// ============================================================================

/// Names of the write-once fields, used in errors and the write log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketField {
    Category,
    Priority,
    Keywords,
    RetrievedDocs,
    Context,
    Response,
    Confidence,
    Escalate,
    EscalationReason,
    ResponseTime,
}

impl TicketField {
    pub const ALL: [Self; 10] = [
        Self::Category,
        Self::Priority,
        Self::Keywords,
        Self::RetrievedDocs,
        Self::Context,
        Self::Response,
        Self::Confidence,
        Self::Escalate,
        Self::EscalationReason,
        Self::ResponseTime,
    ];
}

impl fmt::Display for TicketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TicketField::Category => "category",
            TicketField::Priority => "priority",
            TicketField::Keywords => "keywords",
            TicketField::RetrievedDocs => "retrieved_docs",
            TicketField::Context => "context",
            TicketField::Response => "response",
            TicketField::Confidence => "confidence",
            TicketField::Escalate => "escalate",
            TicketField::EscalationReason => "escalation_reason",
            TicketField::ResponseTime => "response_time",
        };
        f.write_str(name)
    }
}

/// Errors raised by illegal state transitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("field '{0}' was already set")]
    AlreadySet(TicketField),
    #[error("field '{0}' has not been set")]
    Incomplete(TicketField),
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: TicketField, reason: String },
}

/// A value that may be assigned at most once
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOnce<T>(Option<T>);

impl<T> WriteOnce<T> {
    pub const fn empty() -> Self {
        Self(None)
    }

    fn set(&mut self, field: TicketField, value: T) -> Result<(), StateError> {
        if self.0.is_some() {
            return Err(StateError::AlreadySet(field));
        }
        self.0 = Some(value);
        Ok(())
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    fn require(&self, field: TicketField) -> Result<&T, StateError> {
        self.0.as_ref().ok_or(StateError::Incomplete(field))
    }
}

impl<T> Default for WriteOnce<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Serialize> Serialize for WriteOnce<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// ============================================================================
// Recovered errors
// ============================================================================

/// A stage failure that was absorbed by a deterministic fallback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveredError {
    /// Classifier output failed schema validation (`parse_error`)
    ClassificationParse { reason: String },
    /// Generator output failed schema validation
    ResolutionParse { reason: String },
    /// Judgment collaborator was unreachable or returned malformed output
    JudgmentFailure { reason: String },
}

// ============================================================================
// TicketState
// ============================================================================

/// The per-ticket record accumulated across pipeline stages.
#[derive(Debug, Clone, Serialize)]
pub struct TicketState {
    ticket_id: String,
    content: String,
    category: WriteOnce<Category>,
    priority: WriteOnce<Priority>,
    keywords: WriteOnce<Vec<String>>,
    retrieved_docs: WriteOnce<Vec<RetrievedDoc>>,
    context: WriteOnce<String>,
    response: WriteOnce<String>,
    confidence: WriteOnce<f64>,
    escalate: WriteOnce<bool>,
    escalation_reason: WriteOnce<String>,
    response_time: WriteOnce<f64>,
    recovered_errors: Vec<RecoveredError>,
    #[serde(skip)]
    write_log: Vec<TicketField>,
}

impl TicketState {
    /// Create the intake record. `ticket_id` and `content` never change.
    pub fn new(ticket_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            content: content.into(),
            category: WriteOnce::empty(),
            priority: WriteOnce::empty(),
            keywords: WriteOnce::empty(),
            retrieved_docs: WriteOnce::empty(),
            context: WriteOnce::empty(),
            response: WriteOnce::empty(),
            confidence: WriteOnce::empty(),
            escalate: WriteOnce::empty(),
            escalation_reason: WriteOnce::empty(),
            response_time: WriteOnce::empty(),
            recovered_errors: Vec::new(),
            write_log: Vec::new(),
        }
    }

    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> Option<Category> {
        self.category.get().copied()
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority.get().copied()
    }

    pub fn keywords(&self) -> Option<&[String]> {
        self.keywords.get().map(Vec::as_slice)
    }

    pub fn retrieved_docs(&self) -> Option<&[RetrievedDoc]> {
        self.retrieved_docs.get().map(Vec::as_slice)
    }

    pub fn context(&self) -> Option<&str> {
        self.context.get().map(String::as_str)
    }

    pub fn response(&self) -> Option<&str> {
        self.response.get().map(String::as_str)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence.get().copied()
    }

    pub fn escalate(&self) -> Option<bool> {
        self.escalate.get().copied()
    }

    pub fn escalation_reason(&self) -> Option<&str> {
        self.escalation_reason.get().map(String::as_str)
    }

    pub fn response_time(&self) -> Option<f64> {
        self.response_time.get().copied()
    }

    pub fn recovered_errors(&self) -> &[RecoveredError] {
        &self.recovered_errors
    }

    /// Every successful field write, in order.
    pub fn write_log(&self) -> &[TicketField] {
        &self.write_log
    }

    /// Whether a given write-once field has been populated.
    pub fn is_set(&self, field: TicketField) -> bool {
        match field {
            TicketField::Category => self.category.is_set(),
            TicketField::Priority => self.priority.is_set(),
            TicketField::Keywords => self.keywords.is_set(),
            TicketField::RetrievedDocs => self.retrieved_docs.is_set(),
            TicketField::Context => self.context.is_set(),
            TicketField::Response => self.response.is_set(),
            TicketField::Confidence => self.confidence.is_set(),
            TicketField::Escalate => self.escalate.is_set(),
            TicketField::EscalationReason => self.escalation_reason.is_set(),
            TicketField::ResponseTime => self.response_time.is_set(),
        }
    }

    fn logged(&mut self, field: TicketField, result: Result<(), StateError>) -> Result<(), StateError> {
        result?;
        self.write_log.push(field);
        Ok(())
    }

    pub fn set_category(&mut self, value: Category) -> Result<(), StateError> {
        let r = self.category.set(TicketField::Category, value);
        self.logged(TicketField::Category, r)
    }

    pub fn set_priority(&mut self, value: Priority) -> Result<(), StateError> {
        let r = self.priority.set(TicketField::Priority, value);
        self.logged(TicketField::Priority, r)
    }

    pub fn set_keywords(&mut self, value: Vec<String>) -> Result<(), StateError> {
        if value.is_empty() {
            return Err(StateError::InvalidValue {
                field: TicketField::Keywords,
                reason: "keywords must not be empty".to_string(),
            });
        }
        let r = self.keywords.set(TicketField::Keywords, value);
        self.logged(TicketField::Keywords, r)
    }

    pub fn set_retrieved_docs(&mut self, value: Vec<RetrievedDoc>) -> Result<(), StateError> {
        let r = self.retrieved_docs.set(TicketField::RetrievedDocs, value);
        self.logged(TicketField::RetrievedDocs, r)
    }

    pub fn set_context(&mut self, value: String) -> Result<(), StateError> {
        let r = self.context.set(TicketField::Context, value);
        self.logged(TicketField::Context, r)
    }

    pub fn set_response(&mut self, value: String) -> Result<(), StateError> {
        let r = self.response.set(TicketField::Response, value);
        self.logged(TicketField::Response, r)
    }

    pub fn set_confidence(&mut self, value: f64) -> Result<(), StateError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(StateError::InvalidValue {
                field: TicketField::Confidence,
                reason: format!("{value} is outside [0, 1]"),
            });
        }
        let r = self.confidence.set(TicketField::Confidence, value);
        self.logged(TicketField::Confidence, r)
    }

    pub fn set_escalate(&mut self, value: bool) -> Result<(), StateError> {
        let r = self.escalate.set(TicketField::Escalate, value);
        self.logged(TicketField::Escalate, r)
    }

    pub fn set_escalation_reason(&mut self, value: String) -> Result<(), StateError> {
        let r = self.escalation_reason.set(TicketField::EscalationReason, value);
        self.logged(TicketField::EscalationReason, r)
    }

    pub fn set_response_time(&mut self, seconds: f64) -> Result<(), StateError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(StateError::InvalidValue {
                field: TicketField::ResponseTime,
                reason: format!("{seconds} is not a non-negative duration"),
            });
        }
        let r = self.response_time.set(TicketField::ResponseTime, seconds);
        self.logged(TicketField::ResponseTime, r)
    }

    pub fn push_recovered_error(&mut self, error: RecoveredError) {
        self.recovered_errors.push(error);
    }

    /// Collapse a fully populated state into its outcome view.
    ///
    /// Fails with [`StateError::Incomplete`] naming the first unset field.
    pub fn outcome(&self) -> Result<TicketOutcome, StateError> {
        Ok(TicketOutcome {
            ticket_id: self.ticket_id.clone(),
            content: self.content.clone(),
            category: *self.category.require(TicketField::Category)?,
            priority: *self.priority.require(TicketField::Priority)?,
            response: self.response.require(TicketField::Response)?.clone(),
            confidence: *self.confidence.require(TicketField::Confidence)?,
            escalated: *self.escalate.require(TicketField::Escalate)?,
            escalation_reason: self
                .escalation_reason
                .require(TicketField::EscalationReason)?
                .clone(),
            response_time: *self.response_time.require(TicketField::ResponseTime)?,
        })
    }
}

/// Completed-ticket view used by the API and the ticket store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketOutcome {
    pub ticket_id: String,
    pub content: String,
    pub category: Category,
    pub priority: Priority,
    pub response: String,
    pub confidence: f64,
    pub escalated: bool,
    pub escalation_reason: String,
    pub response_time: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_state() -> TicketState {
        let mut s = TicketState::new("TICKET-1", "I can't log in");
        s.set_category(Category::Technical).unwrap();
        s.set_priority(Priority::High).unwrap();
        s.set_keywords(vec!["login".into(), "password".into()]).unwrap();
        s.set_retrieved_docs(Vec::new()).unwrap();
        s.set_context(String::new()).unwrap();
        s.set_response("Try resetting your password".into()).unwrap();
        s.set_confidence(0.85).unwrap();
        s.set_escalate(false).unwrap();
        s.set_escalation_reason("Routine request".into()).unwrap();
        s.set_response_time(1.25).unwrap();
        s
    }

    #[test]
    fn test_category_parsing_is_lenient_on_case_and_separator() {
        assert_eq!("Technical".parse::<Category>().unwrap(), Category::Technical);
        assert_eq!(" billing ".parse::<Category>().unwrap(), Category::Billing);
        assert_eq!("feature-request".parse::<Category>().unwrap(), Category::FeatureRequest);
        assert_eq!("Feature Request".parse::<Category>().unwrap(), Category::FeatureRequest);
        assert!("refund".parse::<Category>().is_err());
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        let err = "critical".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority 'critical'");
    }

    #[test]
    fn test_second_write_is_rejected_and_value_kept() {
        let mut s = TicketState::new("T", "c");
        s.set_category(Category::General).unwrap();
        let err = s.set_category(Category::Billing).unwrap_err();
        assert_eq!(err, StateError::AlreadySet(TicketField::Category));
        assert_eq!(s.category(), Some(Category::General));
        assert_eq!(s.write_log(), &[TicketField::Category]);
    }

    #[test]
    fn test_write_log_records_each_field_once() {
        let s = filled_state();
        assert_eq!(s.write_log().len(), TicketField::ALL.len());
        for field in TicketField::ALL {
            let count = s.write_log().iter().filter(|f| **f == field).count();
            assert_eq!(count, 1, "{field} written {count} times");
            assert!(s.is_set(field));
        }
    }

    #[test]
    fn test_confidence_range_enforced() {
        let mut s = TicketState::new("T", "c");
        assert!(matches!(
            s.set_confidence(1.2),
            Err(StateError::InvalidValue { field: TicketField::Confidence, .. })
        ));
        assert!(s.set_confidence(f64::NAN).is_err());
        assert!(!s.is_set(TicketField::Confidence));
        assert!(s.write_log().is_empty());
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut s = TicketState::new("T", "c");
        assert!(s.set_keywords(Vec::new()).is_err());
    }

    #[test]
    fn test_outcome_requires_complete_state() {
        let mut s = TicketState::new("T", "c");
        s.set_category(Category::Billing).unwrap();
        assert_eq!(s.outcome().unwrap_err(), StateError::Incomplete(TicketField::Priority));

        let outcome = filled_state().outcome().unwrap();
        assert_eq!(outcome.category, Category::Technical);
        assert!(!outcome.escalated);
        assert!((outcome.response_time - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_serializes_unset_fields_as_null() {
        let s = TicketState::new("T", "c");
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["ticket_id"], "T");
        assert!(v["category"].is_null());
        assert!(v.get("write_log").is_none());
    }
}
