use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Serialize;

use crate::{connections::ConnectionRegistry, users::{User, UserRegistry}, AppError, AppResult};

#[derive(Serialize)]
pub(crate) struct OnlineUser {
    username: String,
    gender: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct OnlineUsers {
    online_users: Vec<OnlineUser>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn online_users(
    State(users): State<UserRegistry>,
    State(connections): State<ConnectionRegistry>,
) -> Json<OnlineUsers> {
    let online_users = users
        .genders(connections.online())
        .await
        .into_iter()
        .map(|(username, gender)| OnlineUser { username, gender })
        .collect();

    Json(OnlineUsers { online_users })
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn user_profile(
    Path(username): Path<String>,
    State(users): State<UserRegistry>,
) -> AppResult<Json<User>> {
    users
        .get(&username)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))
}
