//! Decision stages of the ticket pipeline.
//!
//! Each stage owns a disjoint set of `TicketState` fields and returns only
//! those fields as a typed output struct. The orchestrator performs the
//! merge, so a stage has no way to touch another stage's fields.
//!
//! | Stage | Writes |
//! |-------|--------|
//! | [`ClassificationStage`] | category, priority, keywords |
//! | [`RetrievalStage`] | retrieved_docs, context |
//! | [`ResolutionStage`] | response, confidence |
//! | [`EscalationPolicy`] | escalate, escalation_reason |

use crate::collaborators::CollaboratorError;

mod classification;
mod escalation;
mod resolution;
mod retrieval;

pub use classification::{ClassificationOutput, ClassificationStage};
pub use escalation::{EscalationDecision, EscalationPolicy, EscalationRule};
pub use resolution::{ResolutionOutput, ResolutionStage};
pub use retrieval::{format_context, RetrievalOutput, RetrievalStage};

/// Fatal stage failure. Recoverable parse errors never produce this.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("invalid stage input: {0}")]
    InvalidInput(String),
}
