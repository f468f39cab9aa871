//! Workflow orchestrator: drives one ticket through every stage in order.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::PipelinePhase;
use crate::collaborators::{Classifier, Generator, Judge, LlmClassifier, LlmGenerator, LlmJudge, SearchBackend};
use crate::config::LlmConfig;
use crate::llm::LlmBackend;
use crate::metrics::MetricsStore;
use crate::stages::{
    ClassificationOutput, ClassificationStage, EscalationDecision, EscalationPolicy,
    ResolutionOutput, ResolutionStage, RetrievalOutput, RetrievalStage, StageError,
};
use crate::types::{StateError, TicketState};

/// Why a ticket run was abandoned. Nothing is recorded for an abandoned run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Rejected before any stage ran
    #[error("invalid ticket: {0}")]
    InvalidInput(String),

    /// A stage failed fatally
    #[error("{phase} failed: {source}")]
    Stage {
        phase: PipelinePhase,
        #[source]
        source: StageError,
    },

    /// A merge violated the write-once contract
    #[error("state merge failed during {phase}: {source}")]
    State {
        phase: PipelinePhase,
        #[source]
        source: StateError,
    },
}

impl PipelineError {
    /// Whether the caller, not a collaborator, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// The four external collaborators a pipeline needs
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub search: Arc<dyn SearchBackend>,
    pub generator: Arc<dyn Generator>,
    pub judge: Arc<dyn Judge>,
}

impl Collaborators {
    /// Classifier, generator and judge share one LLM backend
    pub fn from_llm(backend: Arc<dyn LlmBackend>, search: Arc<dyn SearchBackend>, llm: &LlmConfig) -> Self {
        Self {
            classifier: Arc::new(LlmClassifier::new(backend.clone(), llm.triage_temperature)),
            search,
            generator: Arc::new(LlmGenerator::new(backend.clone(), llm.resolution_temperature)),
            judge: Arc::new(LlmJudge::new(backend, llm.judgment_temperature)),
        }
    }
}

/// Stateless between tickets apart from its collaborators and the metrics log
pub struct WorkflowOrchestrator {
    classification: ClassificationStage,
    retrieval: RetrievalStage,
    resolution: ResolutionStage,
    escalation: EscalationPolicy,
    metrics: Arc<MetricsStore>,
}

impl WorkflowOrchestrator {
    pub fn new(collaborators: Collaborators, top_k: usize, metrics: Arc<MetricsStore>) -> Self {
        Self {
            classification: ClassificationStage::new(collaborators.classifier),
            retrieval: RetrievalStage::new(collaborators.search, top_k),
            resolution: ResolutionStage::new(collaborators.generator),
            escalation: EscalationPolicy::new(collaborators.judge),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    /// Run one ticket through the whole pipeline.
    ///
    /// Returns the fully populated state. On a fatal stage failure the run
    /// stops where it is and no metrics snapshot is recorded.
    pub async fn process(&self, ticket_id: &str, content: &str) -> Result<TicketState, PipelineError> {
        let started = Instant::now();
        if content.trim().is_empty() {
            return Err(PipelineError::InvalidInput("ticket content is empty".to_string()));
        }

        let mut state = TicketState::new(ticket_id, content);
        let mut phase = PipelinePhase::Intake;
        info!(ticket_id, "Ticket received");

        phase = phase.next();
        let classified = self
            .classification
            .run(content)
            .await
            .map_err(|e| abort(ticket_id, phase, e))?;
        let (category, priority) = (classified.category, classified.priority);
        let keywords = classified.keywords.clone();
        merge_classification(&mut state, classified).map_err(|e| conflict(phase, e))?;

        phase = phase.next();
        let retrieved = self
            .retrieval
            .run(&keywords)
            .await
            .map_err(|e| abort(ticket_id, phase, e))?;
        let context = retrieved.context.clone();
        merge_retrieval(&mut state, retrieved).map_err(|e| conflict(phase, e))?;

        phase = phase.next();
        let resolved = self
            .resolution
            .run(content, &context, category, priority)
            .await
            .map_err(|e| abort(ticket_id, phase, e))?;
        let confidence = resolved.confidence;
        merge_resolution(&mut state, resolved).map_err(|e| conflict(phase, e))?;

        phase = phase.next();
        let decision = self.escalation.decide(content, category, confidence).await;
        merge_escalation(&mut state, decision).map_err(|e| conflict(phase, e))?;

        phase = phase.next();
        state
            .set_response_time(started.elapsed().as_secs_f64())
            .map_err(|e| conflict(phase, e))?;
        self.metrics.record(&state);

        phase = phase.next();
        debug_assert!(phase.is_terminal());
        info!(
            ticket_id,
            category = %category,
            priority = %priority,
            confidence,
            escalated = state.escalate().unwrap_or(true),
            response_time = state.response_time().unwrap_or_default(),
            recovered_errors = state.recovered_errors().len(),
            "Ticket processed"
        );
        Ok(state)
    }
}

fn abort(ticket_id: &str, phase: PipelinePhase, source: StageError) -> PipelineError {
    error!(ticket_id, %phase, error = %source, "Pipeline aborted");
    match source {
        StageError::InvalidInput(reason) if phase == PipelinePhase::Classifying => {
            PipelineError::InvalidInput(reason)
        }
        source => PipelineError::Stage { phase, source },
    }
}

fn conflict(phase: PipelinePhase, source: StateError) -> PipelineError {
    error!(%phase, error = %source, "Ticket state conflict");
    PipelineError::State { phase, source }
}

// ============================================================================
// Merges: each writes only the fields its stage owns
// ============================================================================

fn merge_classification(state: &mut TicketState, out: ClassificationOutput) -> Result<(), StateError> {
    state.set_category(out.category)?;
    state.set_priority(out.priority)?;
    state.set_keywords(out.keywords)?;
    if let Some(err) = out.parse_error {
        warn!(ticket_id = state.ticket_id(), "Classification fell back to defaults");
        state.push_recovered_error(err);
    }
    Ok(())
}

fn merge_retrieval(state: &mut TicketState, out: RetrievalOutput) -> Result<(), StateError> {
    state.set_retrieved_docs(out.retrieved_docs)?;
    state.set_context(out.context)
}

fn merge_resolution(state: &mut TicketState, out: ResolutionOutput) -> Result<(), StateError> {
    state.set_response(out.response)?;
    state.set_confidence(out.confidence)?;
    if let Some(err) = out.parse_error {
        warn!(ticket_id = state.ticket_id(), "Resolution fell back to raw output");
        state.push_recovered_error(err);
    }
    Ok(())
}

fn merge_escalation(state: &mut TicketState, decision: EscalationDecision) -> Result<(), StateError> {
    state.set_escalate(decision.escalate)?;
    state.set_escalation_reason(decision.reason)?;
    if let Some(err) = decision.judgment_error {
        state.push_recovered_error(err);
    }
    Ok(())
}
