//! Roster transition logic
//!
//! Pure functions from (current party state, signal, actor) to the next
//! state. Every transition validates before it commits, so a party is never
//! observable in an inconsistent state. No I/O, no clocks.

use crate::catalog::{Role, MAX_PARTY_SIZE};
use crate::invariants::assert_party_invariants;
use crate::models::{CloseReason, Party, PartyStatus, UserId};
use crate::outcome::{CloseOutcome, JoinOutcome, LeaveOutcome, RemoveOutcome};

/// Apply a join-role signal.
///
/// An actor who already holds a different role switches atomically; the
/// total-occupancy ceiling only applies to genuinely new joins, since a
/// switch does not change the total. The per-role capacity check comes
/// first either way.
pub fn apply_join(party: &mut Party, actor: UserId, role: Role) -> JoinOutcome {
    if !party.is_open() {
        return JoinOutcome::PartyClosed;
    }

    let current = party.roster.role_of(actor);
    if current == Some(role) {
        return JoinOutcome::NoOp;
    }
    if party.roster.members(role).len() >= role.capacity() {
        return JoinOutcome::RoleFull;
    }
    if current.is_none() && party.roster.total() >= MAX_PARTY_SIZE {
        return JoinOutcome::PartyFull;
    }

    if let Some(previous) = current {
        party.roster.remove(previous, actor);
    }
    party.roster.insert(role, actor);
    assert_party_invariants(party);

    JoinOutcome::Applied { previous: current }
}

/// Apply a leave-role signal (a withdrawn reaction, never a command).
pub fn apply_leave(party: &mut Party, actor: UserId, role: Role) -> LeaveOutcome {
    if !party.is_open() {
        return LeaveOutcome::NotApplicable;
    }
    if party.roster.remove(role, actor) {
        assert_party_invariants(party);
        LeaveOutcome::Applied
    } else {
        LeaveOutcome::NotApplicable
    }
}

/// Transition an open party to `Closed`. Authorization is the caller's
/// concern; once this is reached the close is unconditional, independent of
/// roster contents.
pub fn apply_close(party: &mut Party, reason: CloseReason) -> CloseOutcome {
    if !party.is_open() {
        return CloseOutcome::AlreadyClosed;
    }
    party.status = PartyStatus::Closed;
    party.closed_reason = Some(reason);
    CloseOutcome::Closed
}

/// Remove `target` from whichever role they hold. Closed rosters are
/// immutable, so a closed party reports the target as not present.
pub fn apply_remove(party: &mut Party, target: UserId) -> RemoveOutcome {
    if !party.is_open() {
        return RemoveOutcome::NotPresent;
    }
    match party.roster.role_of(target) {
        Some(role) => {
            party.roster.remove(role, target);
            assert_party_invariants(party);
            RemoveOutcome::Removed { role }
        }
        None => RemoveOutcome::NotPresent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn party() -> Party {
        Party::new(1, Uuid::new_v4(), Uuid::new_v4())
    }

    fn user() -> UserId {
        Uuid::new_v4()
    }

    #[test]
    fn test_join_empty_role() {
        let mut p = party();
        let u = user();
        assert_eq!(
            apply_join(&mut p, u, Role::Healer),
            JoinOutcome::Applied { previous: None }
        );
        assert_eq!(p.roster.members(Role::Healer), &[u]);
        assert_eq!(p.roster.total(), 1);
    }

    #[test]
    fn test_rejoin_same_role_is_noop() {
        let mut p = party();
        let u = user();
        apply_join(&mut p, u, Role::Member);
        assert_eq!(apply_join(&mut p, u, Role::Member), JoinOutcome::NoOp);
        assert_eq!(p.roster.total(), 1);
    }

    #[test]
    fn test_switch_moves_between_roles() {
        let mut p = party();
        let u = user();
        apply_join(&mut p, u, Role::Healer);
        assert_eq!(
            apply_join(&mut p, u, Role::Member),
            JoinOutcome::Applied {
                previous: Some(Role::Healer)
            }
        );
        assert!(p.roster.members(Role::Healer).is_empty());
        assert_eq!(p.roster.members(Role::Member), &[u]);
        assert_eq!(p.roster.total(), 1);
    }

    #[test]
    fn test_role_capacity_enforced() {
        let mut p = party();
        apply_join(&mut p, user(), Role::Leader);
        assert_eq!(apply_join(&mut p, user(), Role::Leader), JoinOutcome::RoleFull);

        for _ in 0..6 {
            assert!(matches!(
                apply_join(&mut p, user(), Role::Member),
                JoinOutcome::Applied { .. }
            ));
        }
        assert_eq!(apply_join(&mut p, user(), Role::Member), JoinOutcome::RoleFull);
    }

    #[test]
    fn test_switch_allowed_at_total_ceiling() {
        let mut p = party();
        let healer = user();
        apply_join(&mut p, healer, Role::Healer);
        apply_join(&mut p, user(), Role::Leader);
        for _ in 0..6 {
            apply_join(&mut p, user(), Role::Member);
        }
        // Member is full, so the healer cannot switch there...
        assert_eq!(apply_join(&mut p, healer, Role::Member), JoinOutcome::RoleFull);

        // ...but freeing a member slot lets the switch through even though
        // the party total is still at the ceiling minus one
        let evicted = p.roster.members(Role::Member)[0];
        apply_leave(&mut p, evicted, Role::Member);
        assert_eq!(
            apply_join(&mut p, healer, Role::Member),
            JoinOutcome::Applied {
                previous: Some(Role::Healer)
            }
        );
        assert_eq!(p.roster.total(), 7);
    }

    #[test]
    fn test_ninth_player_rejected_per_capacity_first_rule() {
        let mut p = party();
        apply_join(&mut p, user(), Role::Leader);
        apply_join(&mut p, user(), Role::Healer);
        for _ in 0..6 {
            apply_join(&mut p, user(), Role::Member);
        }
        assert_eq!(p.roster.total(), MAX_PARTY_SIZE);

        // The capacities sum to the party ceiling, so a full party always
        // has every role at capacity and the per-role check fires first
        let ninth = user();
        for role in Role::ALL {
            assert_eq!(apply_join(&mut p, ninth, role), JoinOutcome::RoleFull);
        }
        assert_eq!(p.roster.total(), MAX_PARTY_SIZE);
    }

    #[test]
    fn test_leave() {
        let mut p = party();
        let u = user();
        apply_join(&mut p, u, Role::Member);

        assert_eq!(apply_leave(&mut p, u, Role::Leader), LeaveOutcome::NotApplicable);
        assert_eq!(apply_leave(&mut p, u, Role::Member), LeaveOutcome::Applied);
        assert_eq!(apply_leave(&mut p, u, Role::Member), LeaveOutcome::NotApplicable);
        assert_eq!(p.roster.total(), 0);
    }

    #[test]
    fn test_close_is_terminal() {
        let mut p = party();
        let u = user();
        apply_join(&mut p, u, Role::Member);

        assert_eq!(apply_close(&mut p, CloseReason::Manual), CloseOutcome::Closed);
        assert_eq!(
            apply_close(&mut p, CloseReason::Manual),
            CloseOutcome::AlreadyClosed
        );

        // Roster is immutable from here on
        assert_eq!(apply_join(&mut p, user(), Role::Leader), JoinOutcome::PartyClosed);
        assert_eq!(apply_leave(&mut p, u, Role::Member), LeaveOutcome::NotApplicable);
        assert_eq!(apply_remove(&mut p, u), RemoveOutcome::NotPresent);
        assert_eq!(p.roster.members(Role::Member), &[u]);
    }

    #[test]
    fn test_close_ignores_roster_contents() {
        let mut p = party();
        assert_eq!(apply_close(&mut p, CloseReason::Idle), CloseOutcome::Closed);
        assert_eq!(p.closed_reason, Some(CloseReason::Idle));
    }

    #[test]
    fn test_remove_player() {
        let mut p = party();
        let u = user();
        apply_join(&mut p, u, Role::Healer);

        assert_eq!(apply_remove(&mut p, user()), RemoveOutcome::NotPresent);
        assert_eq!(
            apply_remove(&mut p, u),
            RemoveOutcome::Removed { role: Role::Healer }
        );
        assert_eq!(p.roster.total(), 0);
    }
}
