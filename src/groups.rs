use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::RwLock;

/// Named groups and their members, in join order. Groups are never removed.
#[derive(Clone, Default)]
pub struct GroupRegistry {
    groups: Arc<RwLock<BTreeMap<String, Vec<String>>>>,
}

impl GroupRegistry {
    /// Creates `name` with `creator` as its only member. An existing group is
    /// left untouched. Returns whether the group was created.
    pub async fn create(&self, name: &str, creator: &str) -> bool {
        let mut groups = self.groups.write().await;
        if groups.contains_key(name) {
            return false;
        }
        groups.insert(name.to_owned(), vec![creator.to_owned()]);
        true
    }

    /// Adds `username` to `name`. Returns false when the group does not exist
    /// or the user is already a member.
    pub async fn join(&self, name: &str, username: &str) -> bool {
        let mut groups = self.groups.write().await;
        let Some(members) = groups.get_mut(name) else {
            return false;
        };
        if members.iter().any(|member| member == username) {
            return false;
        }
        members.push(username.to_owned());
        true
    }

    pub async fn members(&self, name: &str) -> Option<Vec<String>> {
        self.groups.read().await.get(name).cloned()
    }

    pub async fn members_of(&self, name: &str) -> Vec<String> {
        self.members(name).await.unwrap_or_default()
    }

    pub async fn names(&self) -> Vec<String> {
        self.groups.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_does_not_reset_existing_group() {
        let groups = GroupRegistry::default();
        assert!(groups.create("g1", "alice").await);
        assert!(groups.join("g1", "bob").await);

        assert!(!groups.create("g1", "carol").await);
        assert!(!groups.create("g1", "alice").await);
        assert_eq!(groups.members_of("g1").await, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let groups = GroupRegistry::default();
        groups.create("g1", "alice").await;
        assert!(groups.join("g1", "bob").await);
        assert!(!groups.join("g1", "bob").await);
        assert!(!groups.join("g1", "alice").await);

        let members = groups.members_of("g1").await;
        assert_eq!(members.iter().filter(|m| *m == "bob").count(), 1);
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn join_unknown_group_is_a_no_op() {
        let groups = GroupRegistry::default();
        assert!(!groups.join("nope", "bob").await);
        assert!(groups.members("nope").await.is_none());
        assert!(groups.members_of("nope").await.is_empty());
        assert!(groups.names().await.is_empty());
    }

    #[tokio::test]
    async fn names_lists_every_group() {
        let groups = GroupRegistry::default();
        groups.create("zeta", "a").await;
        groups.create("alpha", "b").await;
        assert_eq!(groups.names().await, vec!["alpha", "zeta"]);
    }
}
