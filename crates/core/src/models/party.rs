//! Party model - one group-formation session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Role;

use super::{ChannelId, PartyId, UserId, ViewId};
use super::view::{ViewKind, ViewRef};

/// Lifecycle status of a party; `Closed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyStatus {
    Open,
    Closed,
}

/// How a party came to be closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// A creator or administrator closed it
    Manual,
    /// The idleness check found it empty
    Idle,
}

/// Role assignments, one ordered slot per role (insertion order = join order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    slots: [Vec<UserId>; 3],
}

impl Roster {
    /// Members holding `role`, in join order
    pub fn members(&self, role: Role) -> &[UserId] {
        &self.slots[role.index()]
    }

    /// The role `user` currently holds, if any
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| self.slots[role.index()].contains(&user))
    }

    /// Total occupancy across all roles
    pub fn total(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub(crate) fn insert(&mut self, role: Role, user: UserId) {
        self.slots[role.index()].push(user);
    }

    /// Remove `user` from `role`; false if they were not in it
    pub(crate) fn remove(&mut self, role: Role, user: UserId) -> bool {
        let slot = &mut self.slots[role.index()];
        let before = slot.len();
        slot.retain(|u| *u != user);
        slot.len() != before
    }
}

/// A party: a fixed-size team assembled from role-bound slots.
///
/// Parties are never deleted; a closed party stays in the registry as an
/// audit record for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    /// Channel the party was created in; views and notices go there
    pub channel_id: ChannelId,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: PartyStatus,
    /// Set exactly once, when the party transitions to `Closed`
    pub closed_reason: Option<CloseReason>,
    pub roster: Roster,
    canonical_view: Option<ViewId>,
    listing_views: Vec<ViewId>,
}

impl Party {
    pub fn new(id: PartyId, channel_id: ChannelId, creator_id: UserId) -> Self {
        Self {
            id,
            channel_id,
            creator_id,
            created_at: Utc::now(),
            status: PartyStatus::Open,
            closed_reason: None,
            roster: Roster::default(),
            canonical_view: None,
            listing_views: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PartyStatus::Open
    }

    /// Track a view currently displaying this party
    pub fn register_view(&mut self, view: ViewId, kind: ViewKind) {
        match kind {
            ViewKind::Canonical => self.canonical_view = Some(view),
            ViewKind::Listing => {
                if !self.listing_views.contains(&view) {
                    self.listing_views.push(view);
                }
            }
        }
    }

    /// Drop all listing views (a listing refresh replaces them), returning
    /// the retired ids
    pub fn clear_listing_views(&mut self) -> Vec<ViewId> {
        std::mem::take(&mut self.listing_views)
    }

    /// Kind of a tracked view, or `None` if the view does not belong here
    pub fn view_kind(&self, view: ViewId) -> Option<ViewKind> {
        if self.canonical_view == Some(view) {
            Some(ViewKind::Canonical)
        } else if self.listing_views.contains(&view) {
            Some(ViewKind::Listing)
        } else {
            None
        }
    }

    /// Every tracked view, canonical first
    pub fn views(&self) -> Vec<ViewRef> {
        let mut views = Vec::with_capacity(1 + self.listing_views.len());
        if let Some(id) = self.canonical_view {
            views.push(ViewRef {
                id,
                kind: ViewKind::Canonical,
            });
        }
        views.extend(self.listing_views.iter().map(|&id| ViewRef {
            id,
            kind: ViewKind::Listing,
        }));
        views
    }

    /// Immutable copy of everything a renderer needs
    pub fn snapshot(&self) -> PartySnapshot {
        PartySnapshot {
            id: self.id,
            channel_id: self.channel_id,
            creator_id: self.creator_id,
            created_at: self.created_at,
            status: self.status,
            closed_reason: self.closed_reason,
            roster: Role::ALL
                .into_iter()
                .map(|role| RoleRoster {
                    role,
                    members: self.roster.members(role).to_vec(),
                })
                .collect(),
            total: self.roster.total(),
        }
    }
}

/// Members of one role, part of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRoster {
    pub role: Role,
    pub members: Vec<UserId>,
}

/// Point-in-time copy of a party's render-relevant state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub id: PartyId,
    pub channel_id: ChannelId,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: PartyStatus,
    pub closed_reason: Option<CloseReason>,
    pub roster: Vec<RoleRoster>,
    pub total: usize,
}

impl PartySnapshot {
    pub fn is_open(&self) -> bool {
        self.status == PartyStatus::Open
    }

    /// Members holding `role` in this snapshot
    pub fn members(&self, role: Role) -> &[UserId] {
        self.roster
            .iter()
            .find(|r| r.role == role)
            .map(|r| r.members.as_slice())
            .unwrap_or(&[])
    }
}

/// Aggregate counts for the liveness endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCounts {
    pub open: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_party() -> Party {
        Party::new(1, Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_new_party_is_open_and_empty() {
        let party = make_party();
        assert!(party.is_open());
        assert_eq!(party.roster.total(), 0);
        assert!(party.views().is_empty());
    }

    #[test]
    fn test_roster_join_order_preserved() {
        let mut party = make_party();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        party.roster.insert(Role::Member, a);
        party.roster.insert(Role::Member, b);
        party.roster.insert(Role::Member, c);
        assert_eq!(party.roster.members(Role::Member), &[a, b, c]);

        party.roster.remove(Role::Member, b);
        assert_eq!(party.roster.members(Role::Member), &[a, c]);
    }

    #[test]
    fn test_view_tracking() {
        let mut party = make_party();
        let canonical = Uuid::new_v4();
        let listing = Uuid::new_v4();

        party.register_view(canonical, ViewKind::Canonical);
        party.register_view(listing, ViewKind::Listing);
        party.register_view(listing, ViewKind::Listing); // duplicate report

        assert_eq!(party.view_kind(canonical), Some(ViewKind::Canonical));
        assert_eq!(party.view_kind(listing), Some(ViewKind::Listing));
        assert_eq!(party.view_kind(Uuid::new_v4()), None);
        assert_eq!(party.views().len(), 2);

        let retired = party.clear_listing_views();
        assert_eq!(retired, vec![listing]);
        assert_eq!(party.views().len(), 1);
    }

    #[test]
    fn test_snapshot_reflects_roster() {
        let mut party = make_party();
        let user = Uuid::new_v4();
        party.roster.insert(Role::Healer, user);

        let snap = party.snapshot();
        assert_eq!(snap.total, 1);
        assert_eq!(snap.members(Role::Healer), &[user]);
        assert!(snap.members(Role::Leader).is_empty());
    }
}
