use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

/// Unordered pair of usernames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Pair(String, String);

impl Pair {
    fn new(a: &str, b: &str) -> Pair {
        if a <= b {
            Pair(a.to_owned(), b.to_owned())
        } else {
            Pair(b.to_owned(), a.to_owned())
        }
    }
}

#[derive(Default)]
struct Inner {
    threads: HashMap<Pair, Vec<Message>>,
    /// username -> peers it has a thread with.
    peers: HashMap<String, BTreeSet<String>>,
    /// Users with an inbox. Only [`ConversationStore::open`] adds to it.
    known: HashSet<String>,
}

/// Direct-message history. Each pair shares one thread, so both sides always
/// see the same messages in the same order.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<Inner>>,
}

impl ConversationStore {
    /// Makes `username` known with an empty inbox, keeping any existing history.
    pub async fn open(&self, username: &str) {
        self.inner.write().await.known.insert(username.to_owned());
    }

    pub async fn record(&self, sender: &str, receiver: &str, content: &str) -> Message {
        let message = Message {
            id: Uuid::now_v7(),
            sender: sender.to_owned(),
            receiver: receiver.to_owned(),
            content: content.to_owned(),
        };

        let mut inner = self.inner.write().await;
        inner
            .threads
            .entry(Pair::new(sender, receiver))
            .or_default()
            .push(message.clone());
        inner.peers.entry(sender.to_owned()).or_default().insert(receiver.to_owned());
        inner.peers.entry(receiver.to_owned()).or_default().insert(sender.to_owned());

        message
    }

    /// Every thread of `username`, keyed by peer. `None` until the user has been
    /// opened, even if others already wrote to them.
    pub async fn threads_of(&self, username: &str) -> Option<BTreeMap<String, Vec<Message>>> {
        let inner = self.inner.read().await;
        if !inner.known.contains(username) {
            return None;
        }
        Some(
            inner
                .peers
                .get(username)
                .into_iter()
                .flatten()
                .map(|peer| {
                    let thread = inner
                        .threads
                        .get(&Pair::new(username, peer))
                        .cloned()
                        .unwrap_or_default();
                    (peer.clone(), thread)
                })
                .collect(),
        )
    }
}
