//! Which option, if any, this installation has voted for in each poll.
//!
//! The ledger is the only thing standing behind "one vote per user": whoever
//! holds the storage holds the votes. Clearing the storage resets them.

use std::sync::Arc;
use log::{debug, warn};

use crate::db::KeyValueStore;
use crate::error::StorageError;

pub const DEFAULT_PREFIX: &str = "poll_vote_";

#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn key(&self, poll_id: &str) -> String {
        format!("{}{}", self.prefix, poll_id)
    }

    pub async fn get(&self, poll_id: &str) -> Result<Option<usize>, StorageError> {
        let Some(raw) = self.store.get(&self.key(poll_id)).await? else {
            return Ok(None);
        };
        match raw.trim().parse::<usize>() {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                warn!("Ignoring unreadable vote record for poll {}: {:?} ({})", poll_id, raw, e);
                Ok(None)
            }
        }
    }

    /// Records `option_index` for the poll, replacing any earlier choice.
    pub async fn set(&self, poll_id: &str, option_index: usize) -> Result<(), StorageError> {
        debug!("Ledger: poll {} -> option {}", poll_id, option_index);
        self.store
            .set(&self.key(poll_id), &option_index.to_string())
            .await
    }

    pub async fn clear(&self, poll_id: &str) -> Result<(), StorageError> {
        debug!("Ledger: clearing poll {}", poll_id);
        self.store.remove(&self.key(poll_id)).await
    }

    /// Puts the record back exactly as it was before a vote attempt.
    pub async fn restore(
        &self,
        poll_id: &str,
        previous: Option<usize>,
    ) -> Result<(), StorageError> {
        match previous {
            Some(index) => self.set(poll_id, index).await,
            None => self.clear(poll_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};

    fn ledger() -> (Arc<MemoryStore>, VoteLedger) {
        let store = Arc::new(MemoryStore::new());
        let ledger = VoteLedger::new(store.clone(), DEFAULT_PREFIX);
        (store, ledger)
    }

    #[tokio::test]
    async fn records_are_stored_under_the_prefix() {
        let (store, ledger) = ledger();
        ledger.set("1712", 2).await.unwrap();

        assert_eq!(store.get("poll_vote_1712").await.unwrap().as_deref(), Some("2"));
        assert_eq!(ledger.get("1712").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn set_overwrites_previous_choice() {
        let (_, ledger) = ledger();
        ledger.set("p", 0).await.unwrap();
        ledger.set("p", 1).await.unwrap();
        assert_eq!(ledger.get("p").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn restore_clears_or_resets() {
        let (_, ledger) = ledger();
        ledger.set("p", 1).await.unwrap();
        ledger.restore("p", None).await.unwrap();
        assert_eq!(ledger.get("p").await.unwrap(), None);

        ledger.set("p", 1).await.unwrap();
        ledger.restore("p", Some(0)).await.unwrap();
        assert_eq!(ledger.get("p").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn garbage_record_reads_as_absent() {
        let (store, ledger) = ledger();
        store.set("poll_vote_p", "not-a-number").await.unwrap();
        assert_eq!(ledger.get("p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn works_over_sqlite() {
        let store = Arc::new(SqliteStore::open("sqlite::memory:").await.unwrap());
        let ledger = VoteLedger::new(store, "test_");
        ledger.set("p", 4).await.unwrap();
        assert_eq!(ledger.get("p").await.unwrap(), Some(4));
        ledger.clear("p").await.unwrap();
        assert_eq!(ledger.get("p").await.unwrap(), None);
    }
}
