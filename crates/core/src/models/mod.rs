//! Core data models

use uuid::Uuid;

mod party;
mod view;

pub use party::{CloseReason, Party, PartyCounts, PartySnapshot, PartyStatus, RoleRoster, Roster};
pub use view::{ViewKind, ViewRef};

/// Identity of a platform user
pub type UserId = Uuid;

/// Identity of a platform channel
pub type ChannelId = Uuid;

/// Identity of one rendered view (a platform message displaying a party)
pub type ViewId = Uuid;

/// Sequential party identifier, unique for the process lifetime
pub type PartyId = u64;
