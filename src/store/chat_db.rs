//! Messages.app `chat.db` reader
//!
//! Opens the database read-only; Messages keeps writing to it while we run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

use super::{Message, MessageStore, normalize_correspondent};
use crate::{Error, Result};

/// Seconds between the Unix epoch and the Apple epoch (2001-01-01T00:00:00Z)
const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

/// Raw dates above this are nanoseconds (macOS 10.13+), below are seconds
const NANOSECOND_THRESHOLD: i64 = 100_000_000_000;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

const HISTORY_QUERY: &str = "SELECT m.text, m.date, m.is_from_me
     FROM message m
     WHERE m.handle_id IN (SELECT ROWID FROM handle WHERE id = ?1)
       AND m.item_type = 0
       AND m.associated_message_type = 0
     ORDER BY m.date DESC
     LIMIT ?2";

/// Database connection pool
pub type ChatDbPool = Pool<SqliteConnectionManager>;

/// Default location of the Messages database for the current user
#[must_use]
pub fn default_chat_db_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("Library/Messages/chat.db"),
        |d| d.home_dir().join("Library").join("Messages").join("chat.db"),
    )
}

/// Convert a `message.date` value to UTC
///
/// Returns `None` if the value is out of chrono's range.
#[must_use]
pub fn apple_time_to_utc(raw: i64) -> Option<DateTime<Utc>> {
    let (secs, nanos) = if raw.abs() > NANOSECOND_THRESHOLD {
        (
            raw.div_euclid(NANOS_PER_SECOND),
            raw.rem_euclid(NANOS_PER_SECOND),
        )
    } else {
        (raw, 0)
    };

    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(secs.checked_add(APPLE_EPOCH_OFFSET)?, nanos)
}

/// Message store backed by the Messages `SQLite` database
#[derive(Clone)]
pub struct ChatDb {
    pool: ChatDbPool,
}

impl ChatDb {
    /// Open the database read-only
    ///
    /// # Errors
    ///
    /// Returns error if the file does not exist or cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Store(format!(
                "chat database not found at {} (grant Full Disk Access or set CHAT_DB_PATH)",
                path.display()
            )));
        }

        let manager = SqliteConnectionManager::file(path).with_flags(
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        );
        let pool = Pool::builder()
            .max_size(2)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)
            .map_err(|e| Error::Store(e.to_string()))?;

        tracing::info!(path = %path.display(), "opened chat database");
        Ok(Self { pool })
    }

    /// Run the history query on the calling thread
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a row carries an unreadable date
    pub fn fetch_blocking(&self, correspondent: &str, limit: u32) -> Result<Vec<Message>> {
        let handle = normalize_correspondent(correspondent);
        let conn = self.pool.get().map_err(|e| Error::Store(e.to_string()))?;

        let mut stmt = conn.prepare_cached(HISTORY_QUERY)?;
        let rows = stmt
            .query_map(rusqlite::params![handle, limit], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut messages = rows
            .into_iter()
            .map(|(text, date, is_from_me)| {
                let timestamp = apple_time_to_utc(date)
                    .ok_or_else(|| Error::Store(format!("invalid message date {date}")))?;
                Ok(Message {
                    text,
                    timestamp,
                    is_from_me,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Newest-first from the query; callers want oldest first
        messages.reverse();

        tracing::debug!(
            correspondent = %handle,
            limit,
            fetched = messages.len(),
            "fetched message history"
        );
        Ok(messages)
    }
}

#[async_trait]
impl MessageStore for ChatDb {
    async fn fetch(&self, correspondent: &str, limit: u32) -> Result<Vec<Message>> {
        let db = self.clone();
        let correspondent = correspondent.to_string();

        tokio::task::spawn_blocking(move || db.fetch_blocking(&correspondent, limit))
            .await
            .map_err(|e| Error::Store(format!("history query task failed: {e}")))?
    }
}
