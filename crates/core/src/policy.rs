//! Close authorization
//!
//! Join and leave signals need no authorization; closing is gated. The
//! privileged bit comes from the surrounding platform (which owns admin
//! state) and is passed through with the request.

use crate::models::{Party, UserId};

/// Whether `actor` may close `party`: its creator, or anyone the platform
/// marks as privileged.
pub fn can_close(actor: UserId, privileged: bool, party: &Party) -> bool {
    privileged || actor == party.creator_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_creator_can_close() {
        let creator = Uuid::new_v4();
        let party = Party::new(1, Uuid::new_v4(), creator);
        assert!(can_close(creator, false, &party));
    }

    #[test]
    fn test_privileged_actor_can_close() {
        let party = Party::new(1, Uuid::new_v4(), Uuid::new_v4());
        assert!(can_close(Uuid::new_v4(), true, &party));
    }

    #[test]
    fn test_bystander_cannot_close() {
        let party = Party::new(1, Uuid::new_v4(), Uuid::new_v4());
        assert!(!can_close(Uuid::new_v4(), false, &party));
    }
}
