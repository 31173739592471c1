//! Read-only browsing for operators: users with their entry counts, and
//! entries filtered by author or free text.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::debug;

use guestbook_types::api::{AdminEntriesResponse, AdminEntry, AdminUser, AdminUsersResponse};

use crate::entries::entry_from_row;
use crate::error::{ApiResult, join_error};
use crate::state::AppState;
use crate::users::load_user_stats;

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    /// Case-insensitive substring match.
    pub search: Option<String>,
    /// Exact user name (entries only).
    pub user: Option<String>,
}

/// GET /admin/users/?search=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<Json<AdminUsersResponse>> {
    let stats = load_user_stats(&state, non_empty(query.search)).await?;

    let users = stats
        .into_iter()
        .map(|s| AdminUser {
            name: s.name,
            created_at: s.created_at,
            message_count: s.message_count,
        })
        .collect();

    Ok(Json(AdminUsersResponse { users }))
}

/// GET /admin/entries/?search=&user=
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<Json<AdminEntriesResponse>> {
    let search = non_empty(query.search);
    let user = non_empty(query.user);
    debug!("Admin entry search: search={:?} user={:?}", search, user);

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.search_entries(search.as_deref(), user.as_deref())
    })
    .await
    .map_err(join_error)??;

    let entries = rows
        .into_iter()
        .map(|row| entry_from_row(row).map(AdminEntry::from))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(AdminEntriesResponse { entries }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
