//! Ticket Storage
//!
//! `TicketStore` abstracts persistence of completed tickets so the backend
//! can be swapped without touching the API layer:
//! - `InMemoryTicketStore`: tests and single-process deployments
//! - `SledTicketStore`: durable embedded storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{Category, Priority, StateError, TicketOutcome, TicketState};

mod memory;
mod sled_store;

pub use memory::InMemoryTicketStore;
pub use sled_store::SledTicketStore;

/// A completed ticket as persisted and served by `GET /api/tickets`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTicket {
    pub id: String,
    pub content: String,
    pub category: Category,
    pub priority: Priority,
    pub response: String,
    pub confidence: f64,
    pub escalated: bool,
    pub escalation_reason: String,
    pub response_time: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredTicket {
    pub fn from_outcome(outcome: TicketOutcome, now: DateTime<Utc>) -> Self {
        Self {
            id: outcome.ticket_id,
            content: outcome.content,
            category: outcome.category,
            priority: outcome.priority,
            response: outcome.response,
            confidence: outcome.confidence,
            escalated: outcome.escalated,
            escalation_reason: outcome.escalation_reason,
            response_time: outcome.response_time,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the record for `state`, keeping `created_at` from a previous save
    fn prepare(state: &TicketState, previous: Option<&StoredTicket>) -> Result<Self, StoreError> {
        let mut record = Self::from_outcome(state.outcome()?, Utc::now());
        if let Some(previous) = previous {
            record.created_at = previous.created_at;
        }
        Ok(record)
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("refusing to store incomplete ticket: {0}")]
    Incomplete(#[from] StateError),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Trait for pluggable ticket persistence
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait TicketStore: Send + Sync {
    /// Persist a fully processed ticket. Saving an existing id replaces it.
    fn save(&self, state: &TicketState) -> Result<StoredTicket, StoreError>;

    /// Get a ticket by id
    fn get(&self, ticket_id: &str) -> Result<Option<StoredTicket>, StoreError>;

    /// Up to `limit` tickets, most recently created first
    fn list_recent(&self, limit: usize) -> Result<Vec<StoredTicket>, StoreError>;

    /// Number of stored tickets
    fn count(&self) -> Result<usize, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Open the backend selected in configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn TicketStore>, StoreError> {
    Ok(match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryTicketStore::new()),
        StorageBackend::Sled => Arc::new(SledTicketStore::open(&config.path)?),
    })
}
