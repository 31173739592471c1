pub mod admin;
pub mod clock;
pub mod entries;
pub mod error;
pub mod pagination;
pub mod state;
pub mod users;
pub mod validation;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::state::AppState;

/// All guestbook routes. Cross-cutting layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/entries/", get(entries::list_entries).post(entries::create_entry))
        .route("/users-data/", get(users::users_data))
        .route("/admin/users/", get(admin::list_users))
        .route("/admin/entries/", get(admin::list_entries))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
