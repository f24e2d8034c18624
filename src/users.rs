use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{event, AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub age: u32,
    pub gender: String,
}

/// Registered profiles. Insert-only; a profile never changes once stored.
#[derive(Clone, Default)]
pub struct UserRegistry {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl UserRegistry {
    pub async fn register(&self, user: User) -> AppResult<()> {
        if user.username.trim().is_empty() {
            return Err(AppError::Invalid("username must not be empty".to_owned()));
        }
        if event::is_reserved(&user.username) {
            return Err(AppError::Invalid(format!("username {} is reserved", user.username)));
        }

        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(AppError::Conflict("Username already exists".to_owned()));
        }

        tracing::info!(username = %user.username, "registered user");
        users.insert(user.username.clone(), user);
        Ok(())
    }

    pub async fn get(&self, username: &str) -> Option<User> {
        self.users.read().await.get(username).cloned()
    }

    pub async fn contains(&self, username: &str) -> bool {
        self.users.read().await.contains_key(username)
    }

    /// Gender for each of `usernames`, `None` for names that never registered.
    pub async fn genders(&self, usernames: Vec<String>) -> Vec<(String, Option<String>)> {
        let users = self.users.read().await;
        usernames
            .into_iter()
            .map(|name| {
                let gender = users.get(&name).map(|u| u.gender.clone());
                (name, gender)
            })
            .collect()
    }
}
