//! Request outcomes
//!
//! Every mutating request resolves to one of these. Rejections are ordinary
//! results the surrounding layer turns into user feedback, never faults; a
//! rejected request leaves the party untouched.

use crate::catalog::Role;

/// Result of a join-role request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Join committed; carries the role the actor vacated when switching
    Applied { previous: Option<Role> },
    /// Actor already holds the role; nothing changed, nothing to notify
    NoOp,
    /// Target role is at capacity
    RoleFull,
    /// Actor holds no role and the party is at its total ceiling
    PartyFull,
    /// Party is closed; the roster no longer changes
    PartyClosed,
    /// No such party
    NotFound,
}

/// Result of a leave-role request (reaction withdrawn)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Applied,
    /// Actor was not in that role, the party is closed, or it does not exist
    NotApplicable,
}

/// Result of a close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// Actor is neither the creator nor privileged
    Unauthorized,
    /// Redundant close; callers treat this as a no-op
    AlreadyClosed,
    NotFound,
}

/// Result of an administrative removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Target was removed from this role
    Removed { role: Role },
    NotPresent,
    NotFound,
}
