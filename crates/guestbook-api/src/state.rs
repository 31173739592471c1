use std::sync::Arc;

use chrono::Duration;

use guestbook_db::Database;

use crate::clock::Clock;

pub const DEFAULT_PAGE_SIZE: u32 = 3;
pub const DEFAULT_DUPLICATE_WINDOW_SECS: i64 = 300;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub clock: Arc<dyn Clock>,
    pub settings: Settings,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Entries per page on `GET /entries/`.
    pub page_size: u32,
    /// How long an identical message blocks a repost.
    pub duplicate_window: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            duplicate_window: Duration::seconds(DEFAULT_DUPLICATE_WINDOW_SECS),
        }
    }
}
