//! Ticket Processing Pipeline
//!
//! ```text
//! raw ticket
//!   → Classification  (category, priority, keywords)
//!   → Retrieval       (retrieved_docs, context)
//!   → Resolution      (response, confidence)
//!   → EscalationCheck (escalate, escalation_reason)
//!   → Recording       (response_time, metrics snapshot)
//!   → Done
//! ```
//!
//! Stages run strictly in sequence for one ticket. Independent tickets can be
//! processed concurrently; the `MetricsStore` is the only shared state.

mod orchestrator;
mod phase;

pub use orchestrator::{Collaborators, PipelineError, WorkflowOrchestrator};
pub use phase::PipelinePhase;
