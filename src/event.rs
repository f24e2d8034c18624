//! Wire shapes of the websocket protocol.
//!
//! Clients send JSON objects tagged by `type`; the server answers with
//! [`ServerEvent`]s in the same style.

use serde::{Deserialize, Serialize};

/// Receiver value that addresses every connected session.
pub const MAIN: &str = "main";
/// Prefix of a receiver value that addresses a group.
pub const GROUP_PREFIX: &str = "group:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Chat { receiver: String, content: String },
    CreateGroup { group_name: String },
    JoinGroup { group_name: String },
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, thiserror::Error)]
#[error("malformed event: {0}")]
pub struct EventError(#[from] serde_json::Error);

impl ClientEvent {
    pub fn decode(text: &str) -> Result<ClientEvent, EventError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Chat {
        sender: String,
        content: String,
        receiver: String,
    },
    System { content: String },
}

impl ServerEvent {
    pub fn left(username: &str) -> ServerEvent {
        ServerEvent::System {
            content: format!("{username} left the chat"),
        }
    }
}

/// Where a chat message goes, parsed from its `receiver` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient<'a> {
    Everyone,
    Group(&'a str),
    User(&'a str),
}

impl<'a> Recipient<'a> {
    pub fn parse(receiver: &'a str) -> Recipient<'a> {
        if receiver == MAIN {
            Recipient::Everyone
        } else if let Some(group) = receiver.strip_prefix(GROUP_PREFIX) {
            Recipient::Group(group)
        } else {
            Recipient::User(receiver)
        }
    }
}

/// Whether a username would collide with one of the chat addressing forms.
pub fn is_reserved(username: &str) -> bool {
    username == MAIN || username.starts_with(GROUP_PREFIX)
}
