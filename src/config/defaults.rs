//! System-wide default constants.
//!
//! Pipeline policy values are compile-time constants and are deliberately
//! absent from `AppConfig`. Grouped by subsystem for easy discovery.

// ============================================================================
// Escalation policy
// ============================================================================

/// Confidence below this value always escalates, regardless of category.
pub const ESCALATION_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Reason attached to every billing escalation.
pub const BILLING_ESCALATION_REASON: &str = "Billing issues require human review";

// ============================================================================
// Classification fallback
// ============================================================================

/// Keywords used when the classifier output cannot be parsed.
pub const FALLBACK_KEYWORDS: [&str; 2] = ["support", "help"];

/// Upper bound on keywords kept from a classifier reply.
pub const MAX_KEYWORDS: usize = 5;

// ============================================================================
// Resolution fallback
// ============================================================================

/// Confidence assigned when the generator output cannot be parsed.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Response used when the generator returns unparseable *and* blank output.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "Thanks for reaching out. A support specialist will review your request and follow up shortly.";

/// Text handed to the generator when retrieval produced no documents.
pub const NO_DOCUMENTATION_CONTEXT: &str = "No supporting documentation found.";

// ============================================================================
// Retrieval
// ============================================================================

/// Number of documents requested from the search collaborator.
pub const DEFAULT_TOP_K: usize = 3;

// ============================================================================
// HTTP API
// ============================================================================

/// Default `limit` for `GET /api/tickets`.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Hard cap on `limit` for `GET /api/tickets`.
pub const MAX_LIST_LIMIT: usize = 1_000;

/// Maximum accepted request body (bytes). 64 KiB.
pub const MAX_BODY_BYTES: usize = 65_536;

// ============================================================================
// LLM client
// ============================================================================

/// HTTP timeout for inference requests (seconds).
pub const LLM_TIMEOUT_SECS: u64 = 30;

/// Sampling temperature for triage (low for consistent categorisation).
pub const TRIAGE_TEMPERATURE: f64 = 0.1;

/// Sampling temperature for resolution (slightly creative for natural replies).
pub const RESOLUTION_TEMPERATURE: f64 = 0.3;

/// Sampling temperature for escalation judgment (deterministic).
pub const JUDGMENT_TEMPERATURE: f64 = 0.0;
