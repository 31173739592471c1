use axum::{Json, extract::State};

use guestbook_db::models::UserStatsRow;
use guestbook_db::parse_timestamp;
use guestbook_types::api::{UserData, UsersDataResponse};
use guestbook_types::models::UserStats;

use crate::error::{ApiResult, join_error};
use crate::state::AppState;

/// GET /users-data/
pub async fn users_data(State(state): State<AppState>) -> ApiResult<Json<UsersDataResponse>> {
    let stats = load_user_stats(&state, None).await?;

    Ok(Json(UsersDataResponse {
        users: stats.into_iter().map(UserData::from).collect(),
    }))
}

pub(crate) async fn load_user_stats(
    state: &AppState,
    search: Option<String>,
) -> ApiResult<Vec<UserStats>> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.user_stats(search.as_deref()))
        .await
        .map_err(join_error)??;

    let stats = rows
        .into_iter()
        .map(stats_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(stats)
}

fn stats_from_row(row: UserStatsRow) -> anyhow::Result<UserStats> {
    Ok(UserStats {
        created_at: parse_timestamp(&row.created_at)?,
        name: row.name,
        message_count: u64::try_from(row.message_count)?,
        last_entry: row.last_entry,
    })
}
