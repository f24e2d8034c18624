use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use uuid::Uuid;

use crate::{config::Settings, event::ServerEvent};

/// Sending half of a session's outbound queue.
pub type Outbox = mpsc::Sender<ServerEvent>;

#[derive(Clone)]
struct Connection {
    id: Uuid,
    outbox: Outbox,
}

/// Who is reachable right now: username -> the one live outbound queue.
///
/// Fan-out clones the queue handles out of the map before awaiting, so no shard
/// lock is held while a slow recipient's queue is full.
#[derive(Clone)]
pub struct ConnectionRegistry {
    conns: Arc<DashMap<String, Connection>>,
    send_timeout: Duration,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(Settings::default().send_timeout)
    }
}

impl ConnectionRegistry {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            conns: Arc::new(DashMap::new()),
            send_timeout,
        }
    }

    /// Registers `outbox` for `username`, replacing any previous handle. The
    /// replaced queue loses its last sender and closes. Returns the id of the
    /// new registration, needed by [`ConnectionRegistry::release`].
    pub fn connect(&self, username: &str, outbox: Outbox) -> Uuid {
        let id = Uuid::now_v7();
        if self.conns.insert(username.to_owned(), Connection { id, outbox }).is_some() {
            tracing::debug!(username, "replaced existing connection");
        }
        id
    }

    pub fn disconnect(&self, username: &str) -> bool {
        self.conns.remove(username).is_some()
    }

    /// Removes `username` only while registration `id` is still the current one.
    pub fn release(&self, username: &str, id: Uuid) -> bool {
        self.conns.remove_if(username, |_, conn| conn.id == id).is_some()
    }

    pub fn is_online(&self, username: &str) -> bool {
        self.conns.contains_key(username)
    }

    pub fn online(&self) -> Vec<String> {
        let mut names: Vec<String> = self.conns.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub async fn send_to(&self, username: &str, event: ServerEvent) -> bool {
        let Some(conn) = self.conns.get(username).map(|entry| entry.value().clone()) else {
            return false;
        };
        self.deliver(username, &conn, event).await
    }

    /// Delivers to every registered connection. Returns how many accepted it.
    pub async fn broadcast(&self, event: ServerEvent) -> usize {
        let targets: Vec<(String, Connection)> = self
            .conns
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        self.fan_out(targets, event).await
    }

    /// Delivers to those of `usernames` that are online. Returns how many accepted it.
    pub async fn send_to_each(&self, usernames: &[String], event: ServerEvent) -> usize {
        let targets: Vec<(String, Connection)> = usernames
            .iter()
            .filter_map(|name| {
                self.conns
                    .get(name)
                    .map(|entry| (name.clone(), entry.value().clone()))
            })
            .collect();
        self.fan_out(targets, event).await
    }

    async fn fan_out(&self, targets: Vec<(String, Connection)>, event: ServerEvent) -> usize {
        let sends = targets
            .iter()
            .map(|(name, conn)| self.deliver(name, conn, event.clone()));
        join_all(sends).await.into_iter().filter(|delivered| *delivered).count()
    }

    async fn deliver(&self, username: &str, conn: &Connection, event: ServerEvent) -> bool {
        match conn.outbox.send_timeout(event, self.send_timeout).await {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                tracing::warn!(username, "outbound queue full, dropping event");
                false
            }
            Err(SendTimeoutError::Closed(_)) => {
                tracing::debug!(username, "connection already closed, dropping event");
                false
            }
        }
    }
}
