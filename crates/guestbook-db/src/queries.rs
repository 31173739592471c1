use crate::models::{EntryPage, EntryRow, UserRow, UserStatsRow};
use crate::{Database, format_timestamp};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts made on a write transaction before a busy/conflict error is surfaced.
const MAX_WRITE_ATTEMPTS: u32 = 3;

const ENTRY_COLUMNS: &str =
    "e.id, u.name, e.subject, e.message, e.created_at, e.updated_at";

/// An already-validated submission.
pub struct NewEntry<'a> {
    pub name: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
}

pub enum InsertOutcome {
    Created(EntryRow),
    /// The same message text was posted inside the duplicate window; nothing was written.
    DuplicateMessage,
}

impl Database {
    // -- Entries --

    /// Check for a recent duplicate, get-or-create the owner and insert the
    /// entry, all inside one IMMEDIATE transaction. Busy or conflicting
    /// writers are retried.
    pub fn create_entry(
        &self,
        entry: &NewEntry<'_>,
        now: DateTime<Utc>,
        duplicate_window: Duration,
    ) -> Result<InsertOutcome> {
        let mut attempt = 1;
        loop {
            let result =
                self.with_conn_mut(|conn| insert_entry(conn, entry, now, duplicate_window));
            match result {
                Err(e) if attempt < MAX_WRITE_ATTEMPTS && is_retryable(&e) => {
                    warn!("Entry insert attempt {} failed, retrying: {}", attempt, e);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Read the total and one page of entries (newest first) from a single
    /// snapshot. `resolve_page` maps the total onto a page number; `None`
    /// means the requested page does not exist.
    pub fn entries_page<F>(&self, page_size: u32, resolve_page: F) -> Result<Option<EntryPage>>
    where
        F: FnOnce(u64) -> Option<u32>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let count: i64 = tx.query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
            let count = count as u64;

            let Some(page_number) = resolve_page(count) else {
                return Ok(None);
            };
            let offset = i64::from(page_number.saturating_sub(1)) * i64::from(page_size);
            debug!("Entries page {} (offset {}, total {})", page_number, offset, count);

            let rows = query_entries_page(&tx, page_size, offset)?;
            tx.commit()?;

            Ok(Some(EntryPage {
                count,
                page_number,
                rows,
            }))
        })
    }

    /// Total number of entries. Not routed over HTTP; used to check persistence.
    pub fn count_entries(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
            Ok(count as u64)
        })
    }

    /// Entries newest first. `search` matches subject, message or owner name
    /// (case-insensitive substring); `user` filters by exact owner name.
    pub fn search_entries(&self, search: Option<&str>, user: Option<&str>) -> Result<Vec<EntryRow>> {
        let pattern = search.map(like_pattern);
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM entries e
                 JOIN users u ON u.id = e.user_id
                 WHERE (?1 IS NULL
                        OR e.subject LIKE ?1 ESCAPE '\\'
                        OR e.message LIKE ?1 ESCAPE '\\'
                        OR u.name LIKE ?1 ESCAPE '\\')
                   AND (?2 IS NULL OR u.name = ?2)
                 ORDER BY e.created_at DESC, e.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![pattern, user], map_entry_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Users --

    /// Not routed over HTTP; used to check get-or-create results.
    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_name(conn, name))
    }

    /// Per-user entry count and newest entry, in one statement regardless of
    /// the number of users. Users without entries are included with a NULL
    /// `last_entry`.
    pub fn user_stats(&self, search: Option<&str>) -> Result<Vec<UserStatsRow>> {
        let pattern = search.map(like_pattern);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let rows = {
                let mut stmt = tx.prepare(
                    "SELECT u.name,
                            u.created_at,
                            COUNT(DISTINCT e.id) AS message_count,
                            (SELECT l.subject || ' | ' || l.message
                               FROM entries l
                              WHERE l.user_id = u.id
                              ORDER BY l.created_at DESC, l.rowid DESC
                              LIMIT 1) AS last_entry
                     FROM users u
                     LEFT JOIN entries e ON e.user_id = u.id
                     WHERE ?1 IS NULL OR u.name LIKE ?1 ESCAPE '\\'
                     GROUP BY u.id
                     ORDER BY u.created_at DESC, u.rowid DESC",
                )?;
                stmt.query_map([pattern], |row| {
                    Ok(UserStatsRow {
                        name: row.get(0)?,
                        created_at: row.get(1)?,
                        message_count: row.get(2)?,
                        last_entry: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?
            };
            tx.commit()?;
            Ok(rows)
        })
    }

    /// Remove a user and, through the foreign key, every entry they own.
    /// Returns whether a user was deleted.
    pub fn delete_user(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE name = ?1", [name])?;
            Ok(deleted > 0)
        })
    }
}

fn insert_entry(
    conn: &mut Connection,
    entry: &NewEntry<'_>,
    now: DateTime<Utc>,
    duplicate_window: Duration,
) -> Result<InsertOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // A window reaching past the earliest representable time covers everything
    let cutoff = now
        .checked_sub_signed(duplicate_window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let cutoff = format_timestamp(cutoff);
    let duplicate: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM entries WHERE message = ?1 AND created_at >= ?2)",
        rusqlite::params![entry.message, cutoff],
        |row| row.get(0),
    )?;
    if duplicate {
        // Dropping the transaction rolls it back.
        return Ok(InsertOutcome::DuplicateMessage);
    }

    let ts = format_timestamp(now);

    // Race-safe get-or-create guarded by the UNIQUE(name) constraint
    tx.execute(
        "INSERT INTO users (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(name) DO NOTHING",
        rusqlite::params![Uuid::new_v4().to_string(), entry.name, ts],
    )?;
    let user_id: String =
        tx.query_row("SELECT id FROM users WHERE name = ?1", [entry.name], |row| row.get(0))?;

    let entry_id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO entries (id, user_id, subject, message, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        rusqlite::params![entry_id, user_id, entry.subject, entry.message, ts],
    )?;

    tx.commit()?;

    Ok(InsertOutcome::Created(EntryRow {
        id: entry_id,
        user_name: entry.name.to_string(),
        subject: entry.subject.to_string(),
        message: entry.message.to_string(),
        created_at: ts.clone(),
        updated_at: ts,
    }))
}

fn query_user_by_name(conn: &Connection, name: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, created_at, updated_at FROM users WHERE name = ?1")?;

    let row = stmt
        .query_row([name], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_entries_page(conn: &Connection, limit: u32, offset: i64) -> Result<Vec<EntryRow>> {
    // JOIN users to fetch the owner name in a single query
    let sql = format!(
        "SELECT {ENTRY_COLUMNS}
         FROM entries e
         JOIN users u ON u.id = e.user_id
         ORDER BY e.created_at DESC, e.rowid DESC
         LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(rusqlite::params![limit, offset], map_entry_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        user_name: row.get(1)?,
        subject: row.get(2)?,
        message: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Substring LIKE pattern with `%`, `_` and `\` escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn is_retryable(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(e, _)) => matches!(
            e.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::ConstraintViolation
        ),
        _ => false,
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
