//! Ticketflow: Customer Support Ticket Pipeline
//!
//! Runs each support ticket through a fixed chain of decision stages and
//! keeps analytics over the outcomes.
//!
//! ## Architecture
//!
//! - **Pipeline**: `WorkflowOrchestrator` drives classification, retrieval,
//!   resolution and escalation in order, then records metrics
//! - **Stages**: one module per decision, each owning its `TicketState` fields
//! - **Collaborators**: async traits for the classifier, search backend,
//!   generator and judge, with LLM-backed implementations
//! - **Metrics**: append-only snapshot log with null-safe aggregates
//! - **Storage**: in-memory or sled ticket persistence
//! - **API**: axum HTTP surface under `/api`

pub mod api;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod service;
pub mod stages;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use metrics::MetricsStore;
pub use pipeline::{Collaborators, PipelineError, PipelinePhase, WorkflowOrchestrator};
pub use service::Services;
pub use types::{
    Category, MetricsSnapshot, MetricsSummary, Priority, RecoveredError, RetrievedDoc,
    StateError, TicketField, TicketOutcome, TicketState,
};
