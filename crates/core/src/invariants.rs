//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible roster states during
//! development. These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::catalog::{Role, MAX_PARTY_SIZE};
use crate::models::{Party, PartyStatus};

/// Validate that a party's roster is internally consistent
pub fn assert_party_invariants(party: &Party) {
    for role in Role::ALL {
        let occupied = party.roster.members(role).len();
        debug_assert!(
            occupied <= role.capacity(),
            "Party {} has {} in role {:?}, capacity {}",
            party.id,
            occupied,
            role,
            role.capacity()
        );
    }

    debug_assert!(
        party.roster.total() <= MAX_PARTY_SIZE,
        "Party {} holds {} players, ceiling {}",
        party.id,
        party.roster.total(),
        MAX_PARTY_SIZE
    );

    let mut seen = HashSet::new();
    for role in Role::ALL {
        for user in party.roster.members(role) {
            debug_assert!(
                seen.insert(*user),
                "Party {} lists user {} in more than one role",
                party.id,
                user
            );
        }
    }

    // A close reason exists exactly when the party is closed
    debug_assert!(
        (party.status == PartyStatus::Closed) == party.closed_reason.is_some(),
        "Party {} status {:?} disagrees with close reason {:?}",
        party.id,
        party.status,
        party.closed_reason
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_empty_party_is_valid() {
        let party = Party::new(1, Uuid::new_v4(), Uuid::new_v4());
        assert_party_invariants(&party);
    }

    #[test]
    fn test_populated_party_is_valid() {
        let mut party = Party::new(2, Uuid::new_v4(), Uuid::new_v4());
        party.roster.insert(Role::Leader, Uuid::new_v4());
        for _ in 0..6 {
            party.roster.insert(Role::Member, Uuid::new_v4());
        }
        assert_party_invariants(&party);
    }

    #[test]
    #[should_panic(expected = "more than one role")]
    fn test_dual_role_identity_detected() {
        let mut party = Party::new(3, Uuid::new_v4(), Uuid::new_v4());
        let user = Uuid::new_v4();
        party.roster.insert(Role::Leader, user);
        party.roster.insert(Role::Member, user);
        assert_party_invariants(&party);
    }
}
