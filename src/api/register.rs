use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};

use crate::{users::{User, UserRegistry}, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(users): State<UserRegistry>,
    Json(user): Json<User>,
) -> AppResult<Json<Value>> {
    users.register(user).await?;
    Ok(Json(json!({ "message": "User registered successfully" })))
}
