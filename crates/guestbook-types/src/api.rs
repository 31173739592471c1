use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Entry, UserStats};

// -- Entries --

/// Raw entry submission. Every field is optional so that a missing field is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateEntryRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryResponse {
    /// Owner name, denormalized.
    pub user: String,
    pub subject: String,
    pub message: String,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            user: entry.user,
            subject: entry.subject,
            message: entry.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Pagination envelope for `GET /entries/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryListResponse {
    pub count: u64,
    pub page_size: u32,
    pub total_pages: u32,
    pub current_page_number: u32,
    pub links: PageLinks,
    pub entries: Vec<EntryResponse>,
}

// -- Users --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub username: String,
    pub last_entry: Option<String>,
}

impl From<UserStats> for UserData {
    fn from(stats: UserStats) -> Self {
        Self {
            username: stats.name,
            last_entry: stats.last_entry,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersDataResponse {
    pub users: Vec<UserData>,
}

// -- Admin --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub message_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminEntry {
    pub subject: String,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl From<Entry> for AdminEntry {
    fn from(entry: Entry) -> Self {
        Self {
            subject: entry.subject,
            user: entry.user,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminEntriesResponse {
    pub entries: Vec<AdminEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let req: CreateEntryRequest = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("Ada"));
        assert!(req.subject.is_none());
        assert!(req.message.is_none());
    }

    #[test]
    fn test_user_without_entries_serializes_null() {
        let data = UserData {
            username: "Grace Hopper".into(),
            last_entry: None,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["username"], "Grace Hopper");
        assert!(json["last_entry"].is_null());
    }
}
