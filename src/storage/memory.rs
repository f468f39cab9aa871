//! In-memory ticket store
//!
//! Thread-safe via `RwLock`. Not durable — data lost on restart.

use std::sync::RwLock;

use super::{StoreError, StoredTicket, TicketStore};
use crate::types::TicketState;

/// Tickets kept in insertion order
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<Vec<StoredTicket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketStore for InMemoryTicketStore {
    fn save(&self, state: &TicketState) -> Result<StoredTicket, StoreError> {
        let mut tickets = self.tickets.write().map_err(|_| StoreError::Poisoned)?;
        let existing = tickets.iter().position(|t| t.id == state.ticket_id());
        let record = StoredTicket::prepare(state, existing.map(|i| &tickets[i]))?;
        match existing {
            Some(i) => tickets[i] = record.clone(),
            None => tickets.push(record.clone()),
        }
        Ok(record)
    }

    fn get(&self, ticket_id: &str) -> Result<Option<StoredTicket>, StoreError> {
        let tickets = self.tickets.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tickets.iter().find(|t| t.id == ticket_id).cloned())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<StoredTicket>, StoreError> {
        let tickets = self.tickets.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tickets.iter().rev().take(limit).cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.tickets.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
