use crate::{parse_direction, parse_platform, StoreResult, TimelineQuery};
use chat_router_types::{Conversation, Platform, TimelineEntry};
use rusqlite::{Connection, OptionalExtension, Row};

fn row_to_entry(row: &Row) -> rusqlite::Result<TimelineEntry> {
    Ok(TimelineEntry {
        id: row.get("id")?,
        direction: parse_direction(&row.get::<_, String>("direction")?),
        platform: parse_platform(&row.get::<_, String>("platform")?),
        platform_message_id: row.get("platform_message_id")?,
        platform_chat_id: row.get("platform_chat_id")?,
        platform_chat_type: row.get("platform_chat_type")?,
        sender_name: row.get("sender_name")?,
        sender_id: row.get("sender_id")?,
        text: row.get("text")?,
        timestamp: row.get("timestamp")?,
        platform_meta: row.get("platform_meta")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_conversation(row: &Row) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get("id")?,
        platform: parse_platform(&row.get::<_, String>("platform")?),
        platform_chat_id: row.get("platform_chat_id")?,
        platform_chat_type: row.get("platform_chat_type")?,
        label: row.get("label")?,
        first_seen_at: row.get("first_seen_at")?,
        last_message_at: row.get("last_message_at")?,
        message_count: row.get("message_count")?,
    })
}

pub(crate) fn fetch_timeline_row(
    conn: &rusqlite::Transaction,
    id: i64,
) -> rusqlite::Result<TimelineEntry> {
    conn.query_row(
        "SELECT * FROM timeline WHERE id = ?1",
        [id],
        row_to_entry,
    )
}

/// Shared implementation for `getTimeline` / `getUnifiedTimeline`. When
/// `conversation` is `Some`, the result is scoped to that (platform,
/// chatId) pair; otherwise every conversation is included.
/// Shared by `getTimeline`/`getUnifiedTimeline`. The SQL and its bound
/// parameters are built together by index so the `?N` placeholders in
/// the query text always line up with the values passed to it.
pub(crate) fn get_timeline(
    conn: &Connection,
    conversation: Option<(Platform, &str)>,
    query: TimelineQuery,
) -> StoreResult<Vec<TimelineEntry>> {
    let query = query.with_default_limit();
    let mut sql = String::from("SELECT * FROM timeline WHERE 1 = 1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some((platform, chat_id)) = conversation {
        params.push(Box::new(platform.as_str().to_string()));
        sql.push_str(&format!(" AND platform = ?{}", params.len()));
        params.push(Box::new(chat_id.to_string()));
        sql.push_str(&format!(" AND platform_chat_id = ?{}", params.len()));
    }
    if let Some(after) = query.after {
        params.push(Box::new(after));
        sql.push_str(&format!(" AND id > ?{}", params.len()));
    }
    if let Some(before) = query.before {
        params.push(Box::new(before));
        sql.push_str(&format!(" AND id < ?{}", params.len()));
    }
    params.push(Box::new(query.limit));
    sql.push_str(&format!(" ORDER BY id DESC LIMIT ?{}", params.len()));

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), row_to_entry)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn list_conversations(
    conn: &Connection,
    platform: Option<Platform>,
    limit: i64,
) -> StoreResult<Vec<Conversation>> {
    let rows = if let Some(platform) = platform {
        let mut stmt = conn.prepare(
            "SELECT * FROM conversations WHERE platform = ?1 ORDER BY last_message_at DESC LIMIT ?2",
        )?;
        stmt.query_map(rusqlite::params![platform.as_str(), limit], row_to_conversation)?
            .collect::<Result<Vec<_>, _>>()?
    } else {
        let mut stmt =
            conn.prepare("SELECT * FROM conversations ORDER BY last_message_at DESC LIMIT ?1")?;
        stmt.query_map([limit], row_to_conversation)?
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(rows)
}

pub(crate) fn get_conversation(
    conn: &Connection,
    platform: Platform,
    chat_id: &str,
) -> StoreResult<Option<Conversation>> {
    Ok(conn
        .query_row(
            "SELECT * FROM conversations WHERE platform = ?1 AND platform_chat_id = ?2",
            rusqlite::params![platform.as_str(), chat_id],
            row_to_conversation,
        )
        .optional()?)
}
