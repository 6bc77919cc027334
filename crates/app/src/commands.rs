//! Command parsing
//!
//! Commands arrive as raw message text from adapters. Anything that does not
//! parse as a known command is simply not for us and is ignored.

use uuid::Uuid;

use muster_core::{PartyId, Role, UserId, CLOSE_TOKEN, MAX_PARTY_SIZE};

/// Command prefix
pub const PREFIX: char = '!';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `!create_party`
    CreateParty,
    /// `!list_parties`
    ListParties,
    /// `!remove_player <party_id> <user>`
    RemovePlayer { party_id: PartyId, user_id: UserId },
    /// `!commands` (or `!help`)
    Help,
}

/// Parse a message into a command. `None` means "not a command for us".
pub fn parse(text: &str) -> Option<Command> {
    let rest = text.trim().strip_prefix(PREFIX)?;
    let mut parts = rest.split_whitespace();

    match parts.next()? {
        "create_party" => Some(Command::CreateParty),
        "list_parties" => Some(Command::ListParties),
        "commands" | "help" => Some(Command::Help),
        "remove_player" => {
            let party_id = parts.next()?.parse().ok()?;
            let user_id = parse_user_ref(parts.next()?)?;
            Some(Command::RemovePlayer { party_id, user_id })
        }
        _ => None,
    }
}

/// Accepts a bare UUID or a platform mention wrapper like `<@uuid>`
fn parse_user_ref(s: &str) -> Option<UserId> {
    let inner = s
        .strip_prefix("<@")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(s);
    Uuid::parse_str(inner).ok()
}

/// Help text for `!commands`
pub fn help_text(auto_close_secs: u64) -> String {
    let minutes = (auto_close_secs / 60).max(1);
    let mut reactions = String::new();
    for role in Role::ALL {
        reactions.push_str(&format!(
            "  react {} to be {}\n",
            role.token(),
            role.display_name()
        ));
    }

    format!(
        "Available commands:\n\
         !create_party - create a new party\n\
         !list_parties - list every party and its roster (reactions stay live)\n\
         !remove_player <party_id> <user> - remove a player from a party\n\
         !commands - show this list\n\
         \n\
         How to join:\n\
         {reactions}  react {CLOSE_TOKEN} to close the party (creator or admin only)\n\
         \n\
         Rules:\n\
         at most 1 Leader and 1 Healer, up to 6 Members, {MAX_PARTY_SIZE} players total;\n\
         one role per player; an empty party closes itself after {minutes} minutes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("!create_party"), Some(Command::CreateParty));
        assert_eq!(parse("  !list_parties  "), Some(Command::ListParties));
        assert_eq!(parse("!commands"), Some(Command::Help));
        assert_eq!(parse("!help"), Some(Command::Help));
    }

    #[test]
    fn test_parse_remove_player() {
        let user = Uuid::new_v4();

        assert_eq!(
            parse(&format!("!remove_player 3 {user}")),
            Some(Command::RemovePlayer {
                party_id: 3,
                user_id: user
            })
        );
        // Mention form
        assert_eq!(
            parse(&format!("!remove_player 12 <@{user}>")),
            Some(Command::RemovePlayer {
                party_id: 12,
                user_id: user
            })
        );
    }

    #[test]
    fn test_malformed_remove_player_ignored() {
        assert_eq!(parse("!remove_player"), None);
        assert_eq!(parse("!remove_player 3"), None);
        assert_eq!(parse("!remove_player three someone"), None);
        assert_eq!(parse("!remove_player 3 not-a-user"), None);
    }

    #[test]
    fn test_non_commands_ignored() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse("!unknown_command"), None);
        assert_eq!(parse("!"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_help_text_mentions_every_command() {
        let help = help_text(300);
        for needle in [
            "!create_party",
            "!list_parties",
            "!remove_player",
            "!commands",
            "5 minutes",
        ] {
            assert!(help.contains(needle), "help text missing {needle}");
        }
    }
}
