use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Serialize;

use crate::{groups::GroupRegistry, AppError, AppResult};

#[derive(Serialize)]
pub(crate) struct Groups {
    groups: Vec<String>,
}

#[derive(Serialize)]
pub(crate) struct Group {
    name: String,
    members: Vec<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn groups(State(groups): State<GroupRegistry>) -> Json<Groups> {
    Json(Groups { groups: groups.names().await })
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn group(
    Path(name): Path<String>,
    State(groups): State<GroupRegistry>,
) -> AppResult<Json<Group>> {
    let Some(members) = groups.members(&name).await else {
        return Err(AppError::NotFound(format!("group {name}")));
    };

    Ok(Json(Group { name, members }))
}
