//! Runtime event loop
//!
//! The bridge between the gateway and the core: adapter events become core
//! requests, committed core events become rendering directives for every
//! tracked view. Rendering and notice delivery are best-effort; their
//! failures are logged by the adapters and never reach the state machine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use muster_core::models::{ChannelId, PartyId, PartySnapshot, UserId, ViewId, ViewKind};
use muster_core::{
    CloseOutcome, CloseReason, JoinOutcome, LeaveOutcome, PartyEvent, PartyService, RemoveOutcome,
    Role, CLOSE_TOKEN, MAX_PARTY_SIZE,
};
use muster_net::protocol::{Message, RoleSlot, RosterView, ViewKind as WireViewKind};
use muster_net::AdapterEvent;

use crate::commands::{self, Command};
use crate::config::Config;
use crate::janitor::Janitor;

pub struct Runtime {
    service: Arc<PartyService>,
    outbox: mpsc::Sender<Message>,
    janitor: Janitor,
    command_delete: Duration,
    auto_close_secs: u64,
}

impl Runtime {
    pub fn new(service: Arc<PartyService>, outbox: mpsc::Sender<Message>, config: &Config) -> Self {
        Self {
            service,
            janitor: Janitor::new(outbox.clone()),
            outbox,
            command_delete: config.command_delete_delay(),
            auto_close_secs: config.auto_close_secs,
        }
    }

    /// Drive the loop until shutdown
    pub async fn run(
        self,
        mut adapter_events: mpsc::Receiver<AdapterEvent>,
        mut party_events: broadcast::Receiver<PartyEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                Some(event) = adapter_events.recv() => {
                    self.handle_adapter_event(event.message).await;
                }
                result = party_events.recv() => {
                    match result {
                        Ok(event) => self.handle_party_event(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Party event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = shutdown.recv() => {
                    info!("Runtime shutting down");
                    break;
                }
            }
        }
        self.janitor.shutdown();
    }

    async fn handle_adapter_event(&self, message: Message) {
        match message {
            Message::CommandIssued {
                channel_id,
                message_id,
                actor_id,
                text,
                is_privileged,
            } => {
                self.handle_command(channel_id, message_id, actor_id, &text, is_privileged)
                    .await;
            }
            Message::ReactionAdded {
                view_id,
                actor_id,
                emoji,
                is_privileged,
            } => {
                self.handle_reaction_added(view_id, actor_id, &emoji, is_privileged)
                    .await;
            }
            Message::ReactionRemoved {
                view_id,
                actor_id,
                emoji,
            } => {
                self.handle_reaction_removed(view_id, actor_id, &emoji).await;
            }
            Message::ViewOpened {
                party_id,
                view_id,
                kind,
            } => {
                if !self
                    .service
                    .register_view(party_id, view_id, view_kind_from_wire(kind))
                {
                    debug!(party_id, view_id = %view_id, "View reported for unknown party");
                }
            }
            other => {
                debug!(message = ?other, "Ignoring unexpected adapter message");
            }
        }
    }

    async fn handle_command(
        &self,
        channel_id: ChannelId,
        message_id: Uuid,
        actor_id: UserId,
        text: &str,
        _is_privileged: bool,
    ) {
        let Some(command) = commands::parse(text) else {
            return; // not for us
        };

        // The invoking message goes away shortly after handling
        self.janitor.schedule(
            self.command_delete,
            Message::DeleteMessage {
                channel_id,
                message_id,
            },
        );

        match command {
            Command::CreateParty => {
                let party_id = self.service.create_party(channel_id, actor_id);
                // The canonical view opens when the Created event lands
                self.channel_notice(
                    channel_id,
                    format!("Party {party_id} created by <@{actor_id}>! React to join."),
                    Some(10),
                )
                .await;
            }
            Command::ListParties => {
                let snapshots = self.service.list_parties();
                if snapshots.is_empty() {
                    self.channel_notice(
                        channel_id,
                        "No party has been created yet.".to_string(),
                        Some(10),
                    )
                    .await;
                    return;
                }

                for snapshot in snapshots {
                    // Stale listing messages are replaced, not accumulated
                    for stale in self.service.clear_listing_views(snapshot.id) {
                        self.send(Message::RetireView { view_id: stale }).await;
                    }
                    self.send(Message::OpenView {
                        channel_id,
                        party_id: snapshot.id,
                        kind: WireViewKind::Listing,
                        roster: render(&snapshot),
                    })
                    .await;
                }
            }
            Command::RemovePlayer { party_id, user_id } => {
                let text = match self.service.remove_player(party_id, user_id) {
                    RemoveOutcome::Removed { role } => {
                        format!("<@{user_id}> was removed from {role} in party {party_id}!")
                    }
                    RemoveOutcome::NotPresent => {
                        format!("<@{user_id}> is not in party {party_id}.")
                    }
                    RemoveOutcome::NotFound => format!("Party {party_id} does not exist."),
                };
                self.channel_notice(channel_id, text, Some(10)).await;
            }
            Command::Help => {
                self.channel_notice(channel_id, commands::help_text(self.auto_close_secs), None)
                    .await;
            }
        }
    }

    async fn handle_reaction_added(
        &self,
        view_id: ViewId,
        actor_id: UserId,
        emoji: &str,
        is_privileged: bool,
    ) {
        // Reactions on messages we do not track are none of our business
        let Some((party_id, _kind)) = self.service.resolve_view(view_id) else {
            return;
        };

        if emoji == CLOSE_TOKEN {
            match self.service.request_close(party_id, actor_id, is_privileged) {
                CloseOutcome::Closed => {
                    // Views and the closure notice follow from the Closed event
                }
                CloseOutcome::AlreadyClosed => {
                    self.retract(view_id, actor_id, emoji).await;
                }
                CloseOutcome::Unauthorized => {
                    self.retract(view_id, actor_id, emoji).await;
                    self.direct_notice(
                        actor_id,
                        format!(
                            "Only the creator of party {party_id} or an administrator can close it."
                        ),
                    )
                    .await;
                }
                CloseOutcome::NotFound => {}
            }
            return;
        }

        let Some(role) = Role::from_token(emoji) else {
            // Anything else on a tracked view is clutter
            self.retract(view_id, actor_id, emoji).await;
            return;
        };

        match self.service.request_join(party_id, actor_id, role) {
            JoinOutcome::Applied { previous } => {
                // Drop the actor's other role reactions on this view only
                for other in Role::ALL {
                    if other != role {
                        self.retract(view_id, actor_id, other.token()).await;
                    }
                }
                let text = match previous {
                    Some(previous) => {
                        format!("You switched from {previous} to {role} in party {party_id}!")
                    }
                    None => format!("You are now {role} in party {party_id}!"),
                };
                self.direct_notice(actor_id, text).await;
            }
            JoinOutcome::NoOp => {}
            JoinOutcome::RoleFull => {
                self.retract(view_id, actor_id, emoji).await;
                self.direct_notice(
                    actor_id,
                    format!("The {role} slot in party {party_id} is already full."),
                )
                .await;
            }
            JoinOutcome::PartyFull => {
                self.retract(view_id, actor_id, emoji).await;
                self.direct_notice(
                    actor_id,
                    format!("Party {party_id} is already full ({MAX_PARTY_SIZE}/{MAX_PARTY_SIZE} players)."),
                )
                .await;
            }
            JoinOutcome::PartyClosed => {
                self.retract(view_id, actor_id, emoji).await;
                self.direct_notice(actor_id, format!("Party {party_id} has already been closed."))
                    .await;
            }
            JoinOutcome::NotFound => {}
        }
    }

    async fn handle_reaction_removed(&self, view_id: ViewId, actor_id: UserId, emoji: &str) {
        let Some((party_id, _kind)) = self.service.resolve_view(view_id) else {
            return;
        };
        let Some(role) = Role::from_token(emoji) else {
            return;
        };

        match self.service.request_leave(party_id, actor_id, role) {
            LeaveOutcome::Applied => {
                self.direct_notice(actor_id, format!("You left {role} in party {party_id}."))
                    .await;
            }
            LeaveOutcome::NotApplicable => {}
        }
    }

    async fn handle_party_event(&self, event: PartyEvent) {
        match event {
            PartyEvent::Created { party_id } => {
                let Some(snapshot) = self.service.snapshot(party_id) else {
                    return;
                };
                self.send(Message::OpenView {
                    channel_id: snapshot.channel_id,
                    party_id,
                    kind: WireViewKind::Canonical,
                    roster: render(&snapshot),
                })
                .await;
            }
            PartyEvent::RosterChanged { party_id } => {
                self.refresh_views(party_id).await;
            }
            PartyEvent::Closed {
                party_id,
                reason,
                closed_by,
            } => {
                let Some((snapshot, views)) = self.service.render_state(party_id) else {
                    return;
                };
                let roster = render(&snapshot);
                for view in &views {
                    self.send(Message::UpdateView {
                        view_id: view.id,
                        roster: roster.clone(),
                    })
                    .await;
                    self.send(Message::ClearReactions { view_id: view.id }).await;
                }

                match (reason, closed_by) {
                    (CloseReason::Idle, _) => {
                        let minutes = (self.auto_close_secs / 60).max(1);
                        self.channel_notice(
                            snapshot.channel_id,
                            format!(
                                "Party {party_id} was closed automatically after {minutes} minutes without participants."
                            ),
                            None,
                        )
                        .await;
                    }
                    (CloseReason::Manual, closed_by) => {
                        let text = match closed_by {
                            Some(user) => format!("Party {party_id} was closed by <@{user}>!"),
                            None => format!("Party {party_id} was closed."),
                        };
                        self.channel_notice(snapshot.channel_id, text, Some(15)).await;
                    }
                }
            }
        }
    }

    /// Re-render every tracked view of a party from one consistent snapshot
    async fn refresh_views(&self, party_id: PartyId) {
        let Some((snapshot, views)) = self.service.render_state(party_id) else {
            return;
        };
        let roster = render(&snapshot);
        for view in views {
            self.send(Message::UpdateView {
                view_id: view.id,
                roster: roster.clone(),
            })
            .await;
        }
    }

    async fn retract(&self, view_id: ViewId, user_id: UserId, emoji: &str) {
        self.send(Message::RetractReaction {
            view_id,
            user_id,
            emoji: emoji.to_string(),
        })
        .await;
    }

    async fn direct_notice(&self, user_id: UserId, text: String) {
        self.send(Message::DirectNotice { user_id, text }).await;
    }

    async fn channel_notice(&self, channel_id: ChannelId, text: String, expire_secs: Option<u64>) {
        self.send(Message::ChannelNotice {
            channel_id,
            text,
            expire_secs,
        })
        .await;
    }

    async fn send(&self, msg: Message) {
        if self.outbox.send(msg).await.is_err() {
            debug!("Gateway outbox closed, dropping directive");
        }
    }
}

/// Build the render payload for one snapshot
fn render(snapshot: &PartySnapshot) -> RosterView {
    RosterView {
        party_id: snapshot.id,
        creator_id: snapshot.creator_id,
        created_at: snapshot.created_at,
        open: snapshot.is_open(),
        closed_by_idle: snapshot.closed_reason == Some(CloseReason::Idle),
        close_emoji: CLOSE_TOKEN.to_string(),
        slots: snapshot
            .roster
            .iter()
            .map(|entry| RoleSlot {
                emoji: entry.role.token().to_string(),
                label: entry.role.display_name().to_string(),
                capacity: entry.role.capacity() as u8,
                members: entry.members.clone(),
            })
            .collect(),
        total: snapshot.total as u8,
        max_total: MAX_PARTY_SIZE as u8,
    }
}

fn view_kind_from_wire(kind: WireViewKind) -> ViewKind {
    match kind {
        WireViewKind::Canonical => ViewKind::Canonical,
        WireViewKind::Listing => ViewKind::Listing,
    }
}
