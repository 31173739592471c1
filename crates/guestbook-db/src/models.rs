/// Database row types: these map directly to SQLite rows.
/// Distinct from guestbook-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct EntryRow {
    pub id: String,
    /// Owner name, joined from `users`.
    pub user_name: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct UserStatsRow {
    pub name: String,
    pub created_at: String,
    pub message_count: i64,
    /// `None` when the user owns no entries.
    pub last_entry: Option<String>,
}

/// One page of entries together with the total it was cut from, both read
/// inside the same transaction.
pub struct EntryPage {
    pub count: u64,
    pub page_number: u32,
    pub rows: Vec<EntryRow>,
}
