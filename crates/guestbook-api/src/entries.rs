use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};

use guestbook_db::models::EntryRow;
use guestbook_db::{InsertOutcome, NewEntry, parse_timestamp};
use guestbook_types::api::{CreateEntryRequest, EntryListResponse, EntryResponse};
use guestbook_types::models::Entry;

use crate::error::{ApiError, ApiResult, join_error};
use crate::pagination::{PageSelector, base_url, page_links, total_pages};
use crate::state::AppState;
use crate::validation::{ValidationErrors, duplicate_message, validate_entry};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// POST /entries/
pub async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let entry = validate_entry(req).map_err(|errors| {
        warn!("Rejected entry: {}", errors);
        ApiError::Validation(errors)
    })?;

    let now = state.clock.now();

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let new_entry = NewEntry {
            name: &entry.name,
            subject: &entry.subject,
            message: &entry.message,
        };
        db.db.create_entry(&new_entry, now, db.settings.duplicate_window)
    })
    .await
    .map_err(join_error)??;

    match outcome {
        InsertOutcome::Created(row) => {
            info!("Entry {} created by '{}'", row.id, row.user_name);
            let entry = entry_from_row(row)?;
            Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
        }
        InsertOutcome::DuplicateMessage => {
            warn!("Rejected entry: duplicate message inside window");
            Err(ApiError::Validation(ValidationErrors::single(
                "message",
                duplicate_message(state.settings.duplicate_window),
            )))
        }
    }
}

/// GET /entries/?page=N
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Json<EntryListResponse>> {
    let selector = PageSelector::parse(query.page.as_deref())?;
    let page_size = state.settings.page_size;

    let db = state.clone();
    let page = tokio::task::spawn_blocking(move || {
        db.db.entries_page(page_size, |count| selector.resolve(count, page_size))
    })
    .await
    .map_err(join_error)??
    .ok_or(ApiError::InvalidPage)?;

    let total_pages = total_pages(page.count, page_size);
    let links = page_links(&base_url(&headers, &uri), page.page_number, total_pages);

    let entries = page
        .rows
        .into_iter()
        .map(|row| entry_from_row(row).map(EntryResponse::from))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(EntryListResponse {
        count: page.count,
        page_size,
        total_pages,
        current_page_number: page.page_number,
        links,
        entries,
    }))
}

pub(crate) fn entry_from_row(row: EntryRow) -> anyhow::Result<Entry> {
    Ok(Entry {
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        user: row.user_name,
        subject: row.subject,
        message: row.message,
    })
}
