pub mod api;
pub mod appresult;
pub mod config;
pub mod connections;
pub mod conversations;
pub mod dispatch;
pub mod event;
pub mod groups;
pub mod telemetry;
pub mod users;

use axum::{extract::FromRef, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
use config::Settings;
use connections::ConnectionRegistry;
use conversations::ConversationStore;
use groups::GroupRegistry;
use users::UserRegistry;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Settings,
    pub users: UserRegistry,
    pub connections: ConnectionRegistry,
    pub groups: GroupRegistry,
    pub conversations: ConversationStore,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            connections: ConnectionRegistry::new(settings.send_timeout),
            users: UserRegistry::default(),
            groups: GroupRegistry::default(),
            conversations: ConversationStore::default(),
            settings,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

pub fn app(state: AppState) -> Router {
    api::router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
