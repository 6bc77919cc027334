//! Party change events
//!
//! Emitted after a mutation commits, consumed by the rendering collaborator.
//! Events carry ids only; subscribers pull render data through the service,
//! which reads it under the party's own lock.

use crate::models::{CloseReason, PartyId, UserId};

/// A committed change to a party
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartyEvent {
    /// A party was created (empty, open)
    Created { party_id: PartyId },
    /// The roster changed (join, switch, leave, or removal)
    RosterChanged { party_id: PartyId },
    /// The party is closed for good
    Closed {
        party_id: PartyId,
        reason: CloseReason,
        /// The user who closed it; `None` for a system-initiated close
        closed_by: Option<UserId>,
    },
}

impl PartyEvent {
    /// The party this event concerns
    pub fn party_id(&self) -> PartyId {
        match self {
            PartyEvent::Created { party_id }
            | PartyEvent::RosterChanged { party_id }
            | PartyEvent::Closed { party_id, .. } => *party_id,
        }
    }
}
