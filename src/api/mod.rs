mod groups;
mod inbox;
mod register;
mod users;
mod ws;


use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/online_users", get(users::online_users))
        .route("/user_profile/{username}", get(users::user_profile))
        .route("/inbox/{username}", get(inbox::inbox))
        .route("/groups", get(groups::groups))
        .route("/groups/{name}", get(groups::group))
        .route("/ws/{username}", get(ws::chat_ws))
}
