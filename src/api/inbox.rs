use std::collections::BTreeMap;

use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Serialize;

use crate::{conversations::{ConversationStore, Message}, AppError, AppResult};

#[derive(Serialize)]
pub(crate) struct Inbox {
    messages: BTreeMap<String, Vec<Message>>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn inbox(
    Path(username): Path<String>,
    State(conversations): State<ConversationStore>,
) -> AppResult<Json<Inbox>> {
    let Some(messages) = conversations.threads_of(&username).await else {
        return Err(AppError::NotFound(format!("user {username}")));
    };

    Ok(Json(Inbox { messages }))
}
