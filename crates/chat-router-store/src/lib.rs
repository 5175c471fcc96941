//! SQLite-backed persistence for the chat routing hub.
//!
//! One [`Store`] wraps a single `rusqlite::Connection`; callers are
//! expected to guard it behind an async mutex since sqlite only allows
//! one writer at a time. See `ingest` for the transactional compound
//! write that is this crate's reason to exist.

mod queries;

use chat_router_types::{Conversation, Direction, Platform, TimelineEntry};
use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

const SCHEMA_SQL: &str = include_str!("storage/schema.sql");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("database encoding is {0}, expected UTF-8")]
    UnsupportedEncoding(String),
    #[error("store used after close()")]
    PoisonedAfterClose,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A fresh entry to persist. Mirrors [`chat_router_types::InboundMessage`]
/// plus the fields the service layer fills in before handing it to the
/// store (direction, normalized platformMeta, label for the conversation
/// upsert).
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub direction: Direction,
    pub platform: Platform,
    pub platform_message_id: String,
    pub platform_chat_id: String,
    pub platform_chat_type: Option<String>,
    pub sender_name: String,
    pub sender_id: String,
    pub text: Option<String>,
    pub timestamp: i64,
    pub platform_meta: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub message_count: i64,
    pub conversation_count: i64,
}

/// Cursor-paginated query bounds shared by `getTimeline` and
/// `getUnifiedTimeline`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineQuery {
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub limit: i64,
}

impl TimelineQuery {
    pub fn with_default_limit(mut self) -> Self {
        if self.limit <= 0 {
            self.limit = 50;
        }
        self
    }
}

enum Conn {
    Open(Connection),
    Closed,
}

pub struct Store {
    conn: Conn,
}

impl Store {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Conn::Open(conn),
        };
        store.apply_pragmas()?;
        store.verify_encoding()?;
        store.apply_schema()?;
        Ok(store)
    }

    /// Releases the backing connection. Any call after this returns
    /// [`StoreError::PoisonedAfterClose`] rather than panicking — the
    /// spec requires close-then-use to fail loudly, not silently reopen.
    pub fn close(&mut self) {
        self.conn = Conn::Closed;
    }

    fn conn(&self) -> StoreResult<&Connection> {
        match &self.conn {
            Conn::Open(c) => Ok(c),
            Conn::Closed => Err(StoreError::PoisonedAfterClose),
        }
    }

    fn apply_pragmas(&self) -> StoreResult<()> {
        self.conn()?.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        Ok(())
    }

    fn verify_encoding(&self) -> StoreResult<()> {
        let encoding: String = self
            .conn()?
            .pragma_query_value(None, "encoding", |row| row.get(0))?;
        if encoding != "UTF-8" {
            return Err(StoreError::UnsupportedEncoding(encoding));
        }
        Ok(())
    }

    fn apply_schema(&self) -> StoreResult<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Inserts a timeline row and upserts its conversation atomically.
    /// `label` becomes the conversation's label on first sight and on
    /// every subsequent overwrite — callers decide what that label is
    /// (sender name for inbound, `"System"` for recorded responses).
    pub fn ingest(&mut self, entry: NewEntry, label: &str) -> StoreResult<TimelineEntry> {
        let now = Utc::now().to_rfc3339();
        let conn = match &mut self.conn {
            Conn::Open(c) => c,
            Conn::Closed => return Err(StoreError::PoisonedAfterClose),
        };
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO timeline (
                direction, platform, platform_message_id, platform_chat_id,
                platform_chat_type, sender_name, sender_id, text, timestamp,
                platform_meta, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                direction_str(entry.direction),
                entry.platform.as_str(),
                entry.platform_message_id,
                entry.platform_chat_id,
                entry.platform_chat_type,
                entry.sender_name,
                entry.sender_id,
                entry.text,
                entry.timestamp,
                entry.platform_meta,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO conversations (
                platform, platform_chat_id, platform_chat_type, label,
                first_seen_at, last_message_at, message_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, 1)
            ON CONFLICT(platform, platform_chat_id) DO UPDATE SET
                message_count = message_count + 1,
                last_message_at = excluded.last_message_at,
                label = excluded.label,
                platform_chat_type = COALESCE(excluded.platform_chat_type, conversations.platform_chat_type)",
            rusqlite::params![
                entry.platform.as_str(),
                entry.platform_chat_id,
                entry.platform_chat_type,
                label,
                now,
            ],
        )?;

        let row = queries::fetch_timeline_row(&tx, id)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn get_timeline(
        &self,
        platform: Platform,
        chat_id: &str,
        query: TimelineQuery,
    ) -> StoreResult<Vec<TimelineEntry>> {
        queries::get_timeline(self.conn()?, Some((platform, chat_id)), query)
    }

    pub fn get_unified_timeline(&self, query: TimelineQuery) -> StoreResult<Vec<TimelineEntry>> {
        queries::get_timeline(self.conn()?, None, query)
    }

    pub fn list_conversations(
        &self,
        platform: Option<Platform>,
        limit: i64,
    ) -> StoreResult<Vec<Conversation>> {
        queries::list_conversations(self.conn()?, platform, if limit <= 0 { 50 } else { limit })
    }

    pub fn get_conversation(
        &self,
        platform: Platform,
        chat_id: &str,
    ) -> StoreResult<Option<Conversation>> {
        queries::get_conversation(self.conn()?, platform, chat_id)
    }

    pub fn get_stats(&self) -> StoreResult<Stats> {
        let conn = self.conn()?;
        let message_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM timeline", [], |r| r.get(0))?;
        let conversation_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?;
        Ok(Stats {
            message_count,
            conversation_count,
        })
    }
}

fn direction_str(d: Direction) -> &'static str {
    match d {
        Direction::In => "in",
        Direction::Out => "out",
    }
}

pub(crate) fn parse_direction(s: &str) -> Direction {
    match s {
        "out" => Direction::Out,
        _ => Direction::In,
    }
}

pub(crate) fn parse_platform(s: &str) -> Platform {
    Platform::from_str(s).expect("platform column is constrained by CHECK")
}
