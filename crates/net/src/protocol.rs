//! Gateway protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire.
//! Platform adapters bridge a chat platform to the service: platform events
//! flow in, rendering directives flow out. The service never formats user-
//! facing views; adapters own presentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which rendering of a party a view is (mirrors the core view kind but
/// decoupled from it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Canonical,
    Listing,
}

/// One role slot in a render payload, members in join order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSlot {
    pub emoji: String,
    pub label: String,
    pub capacity: u8,
    pub members: Vec<Uuid>,
}

/// Everything an adapter needs to render one party view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterView {
    pub party_id: u64,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub open: bool,
    /// True when the party was closed for idleness rather than by a user
    pub closed_by_idle: bool,
    /// Reaction that requests closing; live only while the party is open
    pub close_emoji: String,
    pub slots: Vec<RoleSlot>,
    pub total: u8,
    pub max_total: u8,
}

/// Gateway protocol messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    // ---- adapter -> service ----
    /// First frame on a new connection
    AdapterHello { adapter_id: Uuid, name: String },

    /// A user issued a text command in a channel
    CommandIssued {
        channel_id: Uuid,
        /// Platform message carrying the command (deleted shortly after)
        message_id: Uuid,
        actor_id: Uuid,
        text: String,
        /// Platform-level administrator bit for the actor
        is_privileged: bool,
    },

    /// A user reacted on a message the adapter knows, tracked or not
    ReactionAdded {
        view_id: Uuid,
        actor_id: Uuid,
        emoji: String,
        is_privileged: bool,
    },

    /// A user withdrew a reaction
    ReactionRemoved {
        view_id: Uuid,
        actor_id: Uuid,
        emoji: String,
    },

    /// The adapter posted a view for an earlier `OpenView`
    ViewOpened {
        party_id: u64,
        view_id: Uuid,
        kind: ViewKind,
    },

    /// Ping to keep the connection alive
    Ping,

    // ---- service -> adapter ----
    /// Handshake accepted
    HelloAck { service: String, version: String },

    /// Handshake refused; the connection is dropped afterwards
    HelloRejected { reason: String },

    /// Post a new message rendering this party; report back with `ViewOpened`
    OpenView {
        channel_id: Uuid,
        party_id: u64,
        kind: ViewKind,
        roster: RosterView,
    },

    /// Re-render an existing view
    UpdateView { view_id: Uuid, roster: RosterView },

    /// Delete a stale listing view
    RetireView { view_id: Uuid },

    /// Remove one user's reaction from a view
    RetractReaction {
        view_id: Uuid,
        user_id: Uuid,
        emoji: String,
    },

    /// Strip every reaction from a view (party closed)
    ClearReactions { view_id: Uuid },

    /// Best-effort private notice; undeliverable notices are dropped
    DirectNotice { user_id: Uuid, text: String },

    /// Channel notice, optionally deleted by the adapter after a delay
    ChannelNotice {
        channel_id: Uuid,
        text: String,
        expire_secs: Option<u64>,
    },

    /// Delete a platform message the service knows the id of
    DeleteMessage { channel_id: Uuid, message_id: Uuid },

    /// Pong response to ping
    Pong,
}

impl Message {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
