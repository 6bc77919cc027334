//! Party registry - owns every party and serializes access per entry
//!
//! The registry-wide lock guards only insert and lookup. Each party sits
//! behind its own mutex, so mutations on different parties never contend
//! and mutations on the same party are linearized. Callers must not perform
//! I/O while inside `with_party`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::models::{
    ChannelId, Party, PartyCounts, PartyId, PartySnapshot, UserId, ViewId, ViewKind,
};

/// Central store of parties for the process lifetime. Parties are never
/// removed; closed ones remain queryable as an audit record.
#[derive(Debug)]
pub struct PartyRegistry {
    parties: RwLock<HashMap<PartyId, Arc<Mutex<Party>>>>,
    next_id: AtomicU64,
}

impl Default for PartyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PartyRegistry {
    pub fn new() -> Self {
        Self {
            parties: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate the next id and insert an empty open party. Never fails.
    pub fn create(&self, channel_id: ChannelId, creator_id: UserId) -> PartyId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let party = Arc::new(Mutex::new(Party::new(id, channel_id, creator_id)));
        self.parties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, party);
        id
    }

    fn entry(&self, id: PartyId) -> Option<Arc<Mutex<Party>>> {
        self.parties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Entries in creation order, detached from the registry lock
    fn entries(&self) -> Vec<(PartyId, Arc<Mutex<Party>>)> {
        let mut entries: Vec<_> = self
            .parties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, party)| (*id, party.clone()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    /// The sole mutation entry point: run `f` with exclusive access to the
    /// party. Returns `None` for an unknown id.
    pub fn with_party<T>(&self, id: PartyId, f: impl FnOnce(&mut Party) -> T) -> Option<T> {
        let entry = self.entry(id)?;
        let mut party = match entry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!(party_id = id, "Party mutex poisoned, recovering");
                poisoned.into_inner()
            }
        };
        Some(f(&mut party))
    }

    /// Snapshot one party
    pub fn snapshot(&self, id: PartyId) -> Option<PartySnapshot> {
        self.with_party(id, |party| party.snapshot())
    }

    /// Snapshot every party, in creation order. Each party is locked just
    /// long enough to copy it, so no party is observed mid-mutation.
    pub fn snapshots(&self) -> Vec<PartySnapshot> {
        self.entries()
            .into_iter()
            .map(|(_, entry)| {
                entry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .snapshot()
            })
            .collect()
    }

    /// Which tracked party (if any) a view belongs to
    pub fn find_view(&self, view: ViewId) -> Option<(PartyId, ViewKind)> {
        self.entries().into_iter().find_map(|(id, entry)| {
            entry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .view_kind(view)
                .map(|kind| (id, kind))
        })
    }

    /// Open/total counts for the liveness endpoint
    pub fn counts(&self) -> PartyCounts {
        let entries = self.entries();
        let total = entries.len();
        let open = entries
            .iter()
            .filter(|(_, entry)| {
                entry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_open()
            })
            .count();
        PartyCounts { open, total }
    }

    pub fn len(&self) -> usize {
        self.parties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Role;
    use crate::roster;
    use uuid::Uuid;

    #[test]
    fn test_ids_are_sequential_from_one() {
        let registry = PartyRegistry::new();
        let channel = Uuid::new_v4();
        assert_eq!(registry.create(channel, Uuid::new_v4()), 1);
        assert_eq!(registry.create(channel, Uuid::new_v4()), 2);
        assert_eq!(registry.create(channel, Uuid::new_v4()), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_party() {
        let registry = PartyRegistry::new();
        assert!(registry.with_party(42, |_| ()).is_none());
        assert!(registry.snapshot(42).is_none());
    }

    #[test]
    fn test_snapshots_in_creation_order() {
        let registry = PartyRegistry::new();
        let channel = Uuid::new_v4();
        for _ in 0..5 {
            registry.create(channel, Uuid::new_v4());
        }
        let ids: Vec<_> = registry.snapshots().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_find_view() {
        let registry = PartyRegistry::new();
        let id = registry.create(Uuid::new_v4(), Uuid::new_v4());
        let view = Uuid::new_v4();

        assert_eq!(registry.find_view(view), None);
        registry.with_party(id, |party| party.register_view(view, ViewKind::Listing));
        assert_eq!(registry.find_view(view), Some((id, ViewKind::Listing)));
    }

    #[test]
    fn test_counts_track_status() {
        let registry = PartyRegistry::new();
        let channel = Uuid::new_v4();
        let a = registry.create(channel, Uuid::new_v4());
        let _b = registry.create(channel, Uuid::new_v4());

        registry.with_party(a, |party| {
            roster::apply_close(party, crate::models::CloseReason::Manual)
        });
        assert_eq!(registry.counts(), PartyCounts { open: 1, total: 2 });
    }

    #[test]
    fn test_concurrent_mutation_stays_consistent() {
        let registry = Arc::new(PartyRegistry::new());
        let channel = Uuid::new_v4();
        let a = registry.create(channel, Uuid::new_v4());
        let b = registry.create(channel, Uuid::new_v4());

        let mut handles = Vec::new();
        for _ in 0..4 {
            for id in [a, b] {
                let registry = registry.clone();
                handles.push(std::thread::spawn(move || {
                    for _ in 0..10 {
                        let user = Uuid::new_v4();
                        registry.with_party(id, |party| {
                            roster::apply_join(party, user, Role::Member)
                        });
                    }
                }));
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for snap in registry.snapshots() {
            assert!(snap.members(Role::Member).len() <= Role::Member.capacity());
            assert_eq!(snap.total, snap.members(Role::Member).len());
        }
    }
}
