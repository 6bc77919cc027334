//! Auto-close scheduling
//!
//! Each party gets exactly one deferred idleness check, a fixed delay after
//! creation. The check re-reads occupancy when it fires; there is no
//! rescheduling and no reset on activity. A party that fills up and later
//! empties out again is never auto-closed - only a manual close applies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::PartyId;
use crate::service::PartyService;

/// Owns the pending idleness checks, one abort handle per party.
pub(crate) struct AutoClose {
    delay: Duration,
    pending: Mutex<HashMap<PartyId, JoinHandle<()>>>,
}

impl AutoClose {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule the single idleness check for a newly created party
    pub(crate) fn schedule(&self, service: Arc<PartyService>, party_id: PartyId) {
        let delay = self.delay;
        // The lock spans spawn+insert: the task's own discard must not run
        // before its handle is in the map
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            service.run_idle_check(party_id);
        });
        pending.insert(party_id, handle);
    }

    /// Abort the pending check for a manually closed party. The aborted
    /// check would have been a no-op; this is cleanup, not behavior.
    pub(crate) fn cancel(&self, party_id: PartyId) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&party_id)
        {
            handle.abort();
            tracing::debug!(party_id, "Canceled pending idle check");
        }
    }

    /// Forget a check that has fired
    pub(crate) fn discard(&self, party_id: PartyId) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&party_id);
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
