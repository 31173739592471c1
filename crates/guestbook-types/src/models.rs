use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single guestbook post, with its owner's name denormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub user: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user aggregate: entry count and the newest entry rendered as
/// `"{subject} | {message}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub message_count: u64,
    pub last_entry: Option<String>,
}
