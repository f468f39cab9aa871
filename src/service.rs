//! Service wiring: turns an `AppConfig` into a ready orchestrator and store.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{ApiSettings, ApiState};
use crate::config::AppConfig;
use crate::context::KeywordIndex;
use crate::llm::{LlmBackend, OpenAiCompatBackend};
use crate::metrics::MetricsStore;
use crate::pipeline::{Collaborators, WorkflowOrchestrator};
use crate::storage::{open_store, TicketStore};

/// Everything a front end (HTTP or CLI) needs to process tickets
#[derive(Clone)]
pub struct Services {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub store: Arc<dyn TicketStore>,
    pub metrics: Arc<MetricsStore>,
}

impl Services {
    /// Build production services: OpenAI-compatible LLM backend, keyword
    /// index seeded with support docs, and the configured ticket store.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.llm.api_key.is_none() {
            warn!("No LLM API key configured; every ticket will fail at classification");
        }
        let backend: Arc<dyn LlmBackend> = Arc::new(
            OpenAiCompatBackend::new(&config.llm).context("Failed to create LLM backend")?,
        );

        let index = KeywordIndex::with_seed_documents();
        if let Some(path) = &config.retrieval.knowledge_file {
            index
                .load_file(path)
                .with_context(|| format!("Failed to load knowledge file {}", path.display()))?;
        }
        info!(documents = index.len(), "Knowledge index ready");

        let store = open_store(&config.storage).context("Failed to open ticket store")?;
        info!(backend = store.backend_name(), "Ticket store ready");

        let collaborators = Collaborators::from_llm(backend, Arc::new(index), &config.llm);
        Ok(Self::assemble(collaborators, config.retrieval.top_k, store))
    }

    /// Build services around caller-supplied collaborators
    pub fn assemble(collaborators: Collaborators, top_k: usize, store: Arc<dyn TicketStore>) -> Self {
        let metrics = Arc::new(MetricsStore::new());
        let orchestrator = Arc::new(WorkflowOrchestrator::new(collaborators, top_k, metrics.clone()));
        Self {
            orchestrator,
            store,
            metrics,
        }
    }

    /// State for the HTTP router
    pub fn api_state(&self, settings: ApiSettings) -> ApiState {
        ApiState::new(self.orchestrator.clone(), self.store.clone()).with_settings(settings)
    }
}
