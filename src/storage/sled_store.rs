//! Sled-backed ticket store
//!
//! Two trees:
//! - `tickets`: ticket id → JSON `StoredTicket`
//! - `tickets_by_time`: created_at nanos (u64 big-endian) ++ id → id
//!
//! Big-endian keys sort chronologically, so listing walks the index in
//! reverse.

use std::path::Path;
use tracing::{info, warn};

use super::{StoreError, StoredTicket, TicketStore};
use crate::types::TicketState;

const TICKETS_TREE: &str = "tickets";
const TIME_INDEX_TREE: &str = "tickets_by_time";

/// Durable ticket store
#[derive(Clone)]
pub struct SledTicketStore {
    db: sled::Db,
    tickets: sled::Tree,
    by_time: sled::Tree,
}

impl SledTicketStore {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let store = Self::from_db(db)?;
        info!(path = %path.as_ref().display(), tickets = store.tickets.len(), "Ticket store opened");
        Ok(store)
    }

    /// Temporary store removed on drop
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            tickets: db.open_tree(TICKETS_TREE)?,
            by_time: db.open_tree(TIME_INDEX_TREE)?,
            db,
        })
    }

    fn time_key(record: &StoredTicket) -> Vec<u8> {
        let nanos = record
            .created_at
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);
        let mut key = nanos.to_be_bytes().to_vec();
        key.extend_from_slice(record.id.as_bytes());
        key
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl TicketStore for SledTicketStore {
    fn save(&self, state: &TicketState) -> Result<StoredTicket, StoreError> {
        let previous = self.get(state.ticket_id())?;
        let record = StoredTicket::prepare(state, previous.as_ref())?;

        self.tickets
            .insert(record.id.as_bytes(), serde_json::to_vec(&record)?)?;
        if previous.is_none() {
            self.by_time
                .insert(Self::time_key(&record), record.id.as_bytes())?;
        }
        Ok(record)
    }

    fn get(&self, ticket_id: &str) -> Result<Option<StoredTicket>, StoreError> {
        match self.tickets.get(ticket_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<StoredTicket>, StoreError> {
        let mut records = Vec::with_capacity(limit.min(self.by_time.len()));
        for item in self.by_time.iter().rev() {
            if records.len() >= limit {
                break;
            }
            let (_key, id) = item?;
            match self.tickets.get(&id)? {
                Some(bytes) => records.push(serde_json::from_slice(&bytes)?),
                None => warn!(id = %String::from_utf8_lossy(&id), "Time index points at missing ticket"),
            }
        }
        Ok(records)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.tickets.len())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::completed_state;

    #[test]
    fn test_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.db");
        {
            let store = SledTicketStore::open(&path).unwrap();
            store.save(&completed_state("TICKET-A", "first")).unwrap();
            store.flush().unwrap();
        }
        let store = SledTicketStore::open(&path).unwrap();
        let ticket = store.get("TICKET-A").unwrap().unwrap();
        assert_eq!(ticket.content, "first");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_most_recent_first() {
        let store = SledTicketStore::temporary().unwrap();
        for i in 0..4 {
            store.save(&completed_state(&format!("TICKET-{i}"), "c")).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let ids: Vec<_> = store.list_recent(10).unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["TICKET-3", "TICKET-2", "TICKET-1", "TICKET-0"]);
        assert_eq!(store.list_recent(2).unwrap().len(), 2);
    }

    #[test]
    fn test_resave_does_not_duplicate_index() {
        let store = SledTicketStore::temporary().unwrap();
        let first = store.save(&completed_state("TICKET-1", "c")).unwrap();
        let second = store.save(&completed_state("TICKET-1", "c")).unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.list_recent(10).unwrap().len(), 1);
        assert_eq!(store.count().unwrap(), 1);
    }
}
