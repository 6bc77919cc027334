//! Party service - the operations exposed to the command/event layer
//!
//! State transitions commit under the party's own lock and the lock is
//! released before anything else happens; events (and whatever rendering or
//! notification work subscribers do with them) never hold it. A rendering
//! failure downstream can therefore never roll back a committed transition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::autoclose::AutoClose;
use crate::catalog::Role;
use crate::event::PartyEvent;
use crate::models::{
    ChannelId, CloseReason, PartyCounts, PartyId, PartySnapshot, UserId, ViewId, ViewKind, ViewRef,
};
use crate::outcome::{CloseOutcome, JoinOutcome, LeaveOutcome, RemoveOutcome};
use crate::registry::PartyRegistry;
use crate::{policy, roster};

/// Capacity of the event channel; subscribers that lag get `Lagged` and
/// resynchronize from snapshots
const EVENT_CAPACITY: usize = 256;

pub struct PartyService {
    registry: PartyRegistry,
    idle_check: AutoClose,
    events: broadcast::Sender<PartyEvent>,
}

impl PartyService {
    /// Build a service whose parties auto-close `idle_after` after creation
    /// if still empty
    pub fn new(idle_after: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            registry: PartyRegistry::new(),
            idle_check: AutoClose::new(idle_after),
            events,
        })
    }

    /// Subscribe to committed party changes
    pub fn subscribe(&self) -> broadcast::Receiver<PartyEvent> {
        self.events.subscribe()
    }

    /// Create an empty open party and schedule its one idleness check.
    /// Never fails.
    pub fn create_party(self: &Arc<Self>, channel_id: ChannelId, creator_id: UserId) -> PartyId {
        let party_id = self.registry.create(channel_id, creator_id);
        tracing::info!(party_id, creator = %creator_id, "Party created");
        self.idle_check.schedule(Arc::clone(self), party_id);
        self.emit(PartyEvent::Created { party_id });
        party_id
    }

    /// Join `role`, switching out of any currently held role
    pub fn request_join(&self, party_id: PartyId, actor: UserId, role: Role) -> JoinOutcome {
        let outcome = self
            .registry
            .with_party(party_id, |party| roster::apply_join(party, actor, role))
            .unwrap_or(JoinOutcome::NotFound);

        if let JoinOutcome::Applied { previous } = outcome {
            tracing::debug!(party_id, actor = %actor, ?role, ?previous, "Roster join applied");
            self.emit(PartyEvent::RosterChanged { party_id });
        }
        outcome
    }

    /// Leave `role`; fired when a role reaction is withdrawn
    pub fn request_leave(&self, party_id: PartyId, actor: UserId, role: Role) -> LeaveOutcome {
        let outcome = self
            .registry
            .with_party(party_id, |party| roster::apply_leave(party, actor, role))
            .unwrap_or(LeaveOutcome::NotApplicable);

        if outcome == LeaveOutcome::Applied {
            tracing::debug!(party_id, actor = %actor, ?role, "Roster leave applied");
            self.emit(PartyEvent::RosterChanged { party_id });
        }
        outcome
    }

    /// Close the party on behalf of `actor`. A closed party rejects the
    /// request as redundant before authorization is even considered.
    pub fn request_close(&self, party_id: PartyId, actor: UserId, privileged: bool) -> CloseOutcome {
        let outcome = self
            .registry
            .with_party(party_id, |party| {
                if !party.is_open() {
                    CloseOutcome::AlreadyClosed
                } else if !policy::can_close(actor, privileged, party) {
                    CloseOutcome::Unauthorized
                } else {
                    roster::apply_close(party, CloseReason::Manual)
                }
            })
            .unwrap_or(CloseOutcome::NotFound);

        if outcome == CloseOutcome::Closed {
            self.idle_check.cancel(party_id);
            tracing::info!(party_id, closed_by = %actor, "Party closed");
            self.emit(PartyEvent::Closed {
                party_id,
                reason: CloseReason::Manual,
                closed_by: Some(actor),
            });
        }
        outcome
    }

    /// Administrative removal from whichever role the target holds.
    /// Authorization is the command layer's concern.
    pub fn remove_player(&self, party_id: PartyId, target: UserId) -> RemoveOutcome {
        let outcome = self
            .registry
            .with_party(party_id, |party| roster::apply_remove(party, target))
            .unwrap_or(RemoveOutcome::NotFound);

        if let RemoveOutcome::Removed { role } = outcome {
            tracing::info!(party_id, target = %target, ?role, "Player removed");
            self.emit(PartyEvent::RosterChanged { party_id });
        }
        outcome
    }

    /// The deferred idleness check: close if still open and empty, otherwise
    /// do nothing. System-initiated, so it bypasses authorization.
    pub(crate) fn run_idle_check(&self, party_id: PartyId) {
        self.idle_check.discard(party_id);

        let closed = self
            .registry
            .with_party(party_id, |party| {
                if party.is_open() && party.roster.total() == 0 {
                    roster::apply_close(party, CloseReason::Idle) == CloseOutcome::Closed
                } else {
                    false
                }
            })
            .unwrap_or(false);

        if closed {
            tracing::info!(party_id, "Party auto-closed for inactivity");
            self.emit(PartyEvent::Closed {
                party_id,
                reason: CloseReason::Idle,
                closed_by: None,
            });
        } else {
            tracing::debug!(party_id, "Idle check found activity, leaving party as is");
        }
    }

    /// Snapshots of every party, creation order
    pub fn list_parties(&self) -> Vec<PartySnapshot> {
        self.registry.snapshots()
    }

    pub fn snapshot(&self, party_id: PartyId) -> Option<PartySnapshot> {
        self.registry.snapshot(party_id)
    }

    /// Snapshot plus tracked views, read atomically under the party lock so
    /// the fan-out never mixes two roster states
    pub fn render_state(&self, party_id: PartyId) -> Option<(PartySnapshot, Vec<ViewRef>)> {
        self.registry
            .with_party(party_id, |party| (party.snapshot(), party.views()))
    }

    /// Track a view the rendering side opened for this party
    pub fn register_view(&self, party_id: PartyId, view: ViewId, kind: ViewKind) -> bool {
        self.registry
            .with_party(party_id, |party| party.register_view(view, kind))
            .is_some()
    }

    /// Retire all listing views before a listing refresh, returning the ids
    /// to delete
    pub fn clear_listing_views(&self, party_id: PartyId) -> Vec<ViewId> {
        self.registry
            .with_party(party_id, |party| party.clear_listing_views())
            .unwrap_or_default()
    }

    /// Which tracked party a view belongs to, if any
    pub fn resolve_view(&self, view: ViewId) -> Option<(PartyId, ViewKind)> {
        self.registry.find_view(view)
    }

    /// Open/total counts for the liveness endpoint
    pub fn counts(&self) -> PartyCounts {
        self.registry.counts()
    }

    fn emit(&self, event: PartyEvent) {
        // No subscribers yet is fine; events are advisory for rendering
        let _ = self.events.send(event);
    }

    #[cfg(test)]
    pub(crate) fn pending_idle_checks(&self) -> usize {
        self.idle_check.pending_count()
    }
}
