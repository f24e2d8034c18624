//! Routes inbound client events to their recipients.

use axum::extract::FromRef;
use uuid::Uuid;

use crate::{
    connections::{ConnectionRegistry, Outbox},
    conversations::ConversationStore,
    event::{ClientEvent, Recipient, ServerEvent},
    groups::GroupRegistry,
    AppState,
};

#[derive(Clone)]
pub struct Dispatcher {
    connections: ConnectionRegistry,
    groups: GroupRegistry,
    conversations: ConversationStore,
}

impl FromRef<AppState> for Dispatcher {
    fn from_ref(state: &AppState) -> Self {
        Dispatcher::new(
            state.connections.clone(),
            state.groups.clone(),
            state.conversations.clone(),
        )
    }
}

impl Dispatcher {
    pub fn new(
        connections: ConnectionRegistry,
        groups: GroupRegistry,
        conversations: ConversationStore,
    ) -> Self {
        Self { connections, groups, conversations }
    }

    /// Registers a session for `username` and makes sure it has an inbox.
    pub async fn connect(&self, username: &str, outbox: Outbox) -> Uuid {
        let id = self.connections.connect(username, outbox);
        self.conversations.open(username).await;
        tracing::info!(username, %id, "connected");
        id
    }

    /// Ends session `id`. If it was still the live one, everybody left online
    /// is told the user left.
    pub async fn disconnect(&self, username: &str, id: Uuid) {
        if !self.connections.release(username, id) {
            tracing::debug!(username, %id, "session already replaced");
            return;
        }

        tracing::info!(username, %id, "disconnected");
        self.connections.broadcast(ServerEvent::left(username)).await;
    }

    /// Decodes a raw frame and handles it. Malformed frames are logged and dropped.
    pub async fn handle_text(&self, sender: &str, text: &str) {
        match ClientEvent::decode(text) {
            Ok(event) => self.handle(sender, event).await,
            Err(err) => tracing::warn!(sender, error = %err, "dropping event"),
        }
    }

    pub async fn handle(&self, sender: &str, event: ClientEvent) {
        match event {
            ClientEvent::Chat { receiver, content } => self.chat(sender, receiver, content).await,
            ClientEvent::CreateGroup { group_name } => {
                if self.groups.create(&group_name, sender).await {
                    tracing::info!(sender, group = %group_name, "group created");
                }
            }
            ClientEvent::JoinGroup { group_name } => {
                if self.groups.join(&group_name, sender).await {
                    tracing::info!(sender, group = %group_name, "joined group");
                }
            }
            ClientEvent::Unrecognized => {
                tracing::debug!(sender, "ignoring unrecognized event type");
            }
        }
    }

    async fn chat(&self, sender: &str, receiver: String, content: String) {
        let envelope = ServerEvent::Chat {
            sender: sender.to_owned(),
            content: content.clone(),
            receiver: receiver.clone(),
        };

        match Recipient::parse(&receiver) {
            Recipient::Everyone => {
                let delivered = self.connections.broadcast(envelope).await;
                tracing::debug!(sender, delivered, "broadcast");
            }
            Recipient::Group(group) => {
                let members = self.groups.members_of(group).await;
                let delivered = self.connections.send_to_each(&members, envelope).await;
                tracing::debug!(sender, group, delivered, "group message");
            }
            Recipient::User(peer) => {
                let delivered = self.connections.send_to(peer, envelope).await;
                self.conversations.record(sender, peer, &content).await;
                tracing::debug!(sender, receiver = peer, delivered, "direct message");
            }
        }
    }
}
