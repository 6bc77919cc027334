//! Role catalog - fixed roles, their reaction tokens, and capacities

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reaction token that requests closing a party
pub const CLOSE_TOKEN: &str = "❌";

/// Maximum total occupancy across all roles of one party
pub const MAX_PARTY_SIZE: usize = 8;

/// Party roles, fixed at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Shot-caller, one per party
    Leader,
    /// Support slot, one per party
    Healer,
    /// Rank and file, up to six
    Member,
}

impl Role {
    /// All roles in display order
    pub const ALL: [Role; 3] = [Role::Leader, Role::Healer, Role::Member];

    /// Map a reaction token to a role; anything unrecognized is not a
    /// role-change signal and yields `None`
    pub fn from_token(token: &str) -> Option<Role> {
        match token {
            "🛡️" => Some(Role::Leader),
            "⚕️" => Some(Role::Healer),
            "⚔️" => Some(Role::Member),
            _ => None,
        }
    }

    /// Reaction token displayed for this role
    pub fn token(&self) -> &'static str {
        match self {
            Role::Leader => "🛡️",
            Role::Healer => "⚕️",
            Role::Member => "⚔️",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Leader => "Leader",
            Role::Healer => "Healer",
            Role::Member => "Member",
        }
    }

    /// Maximum occupancy for this role
    pub fn capacity(&self) -> usize {
        match self {
            Role::Leader => 1,
            Role::Healer => 1,
            Role::Member => 6,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Role::Leader => 0,
            Role::Healer => 1,
            Role::Member => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_token(role.token()), Some(role));
        }
    }

    #[test]
    fn test_unrecognized_token_is_not_a_signal() {
        assert_eq!(Role::from_token("🎉"), None);
        assert_eq!(Role::from_token(""), None);
        assert_eq!(Role::from_token(CLOSE_TOKEN), None);
    }

    #[test]
    fn test_party_size_matches_capacities() {
        let total: usize = Role::ALL.iter().map(|r| r.capacity()).sum();
        assert_eq!(total, MAX_PARTY_SIZE);
    }
}
