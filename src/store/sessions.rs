//! Chat session persistence.
//!
//! Sessions are listed newest-first by `updated_at`. Message lists are stored
//! as JSON and truncated to the most recent 100 entries on every update; a
//! malformed stored list decodes to empty rather than failing the read.

use anyhow::Result;
use rusqlite::{params, Connection, Row};

use crate::decode::decode_json;
use crate::model::{cap_messages, session_preview, ChatMessage, ChatSession};
use crate::store::{devices, parse_ts};

/// List the device's sessions, newest first.
pub fn list_sessions(conn: &Connection, device_id: &str) -> Result<Vec<ChatSession>> {
    devices::ensure_device(conn, device_id)?;

    let mut stmt = conn.prepare(
        "SELECT id, title, preview, updated_at, messages_json \
         FROM sessions WHERE device_id = ?1 ORDER BY updated_at DESC, id DESC",
    )?;
    let sessions = stmt
        .query_map(params![device_id], row_to_session)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}

/// Create a session from the first user message, deriving its title.
pub fn create_session(
    conn: &Connection,
    device_id: &str,
    first_message_text: &str,
) -> Result<ChatSession> {
    devices::ensure_device(conn, device_id)?;

    let session = ChatSession::from_first_message(
        first_message_text,
        uuid::Uuid::now_v7().to_string(),
        chrono::Utc::now(),
    );
    conn.execute(
        "INSERT INTO sessions (id, device_id, title, preview, updated_at, messages_json) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            session.id,
            device_id,
            session.title,
            session.preview,
            session.updated_at.to_rfc3339(),
            serde_json::to_string(&session.messages)?,
        ],
    )?;
    tracing::debug!(device_id, id = %session.id, "session created");
    Ok(session)
}

/// Replace a session's message list (capped at 100), refreshing its preview
/// and `updated_at`. Updating an unknown session id is a no-op.
pub fn update_session(
    conn: &Connection,
    device_id: &str,
    id: &str,
    messages: Vec<ChatMessage>,
) -> Result<()> {
    devices::ensure_device(conn, device_id)?;

    let capped = cap_messages(messages);
    let preview = capped
        .last()
        .map(|m| session_preview(&m.text))
        .unwrap_or_default();
    conn.execute(
        "UPDATE sessions SET preview = ?1, updated_at = ?2, messages_json = ?3 \
         WHERE id = ?4 AND device_id = ?5",
        params![
            preview,
            chrono::Utc::now().to_rfc3339(),
            serde_json::to_string(&capped)?,
            id,
            device_id,
        ],
    )?;
    Ok(())
}

/// Delete one session and return the remaining list, newest first.
pub fn delete_session(conn: &Connection, device_id: &str, id: &str) -> Result<Vec<ChatSession>> {
    devices::ensure_device(conn, device_id)?;

    conn.execute(
        "DELETE FROM sessions WHERE id = ?1 AND device_id = ?2",
        params![id, device_id],
    )?;
    list_sessions(conn, device_id)
}

/// Delete every session for the device.
pub fn clear_sessions(conn: &Connection, device_id: &str) -> Result<()> {
    devices::ensure_device(conn, device_id)?;

    conn.execute(
        "DELETE FROM sessions WHERE device_id = ?1",
        params![device_id],
    )?;
    Ok(())
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<ChatSession> {
    let updated_at: String = row.get(3)?;
    let messages_json: String = row.get(4)?;
    Ok(ChatSession {
        id: row.get(0)?,
        title: row.get(1)?,
        preview: row.get(2)?,
        updated_at: parse_ts(&updated_at),
        messages: decode_json::<Vec<ChatMessage>>(Some(&messages_json)).value_or_default(),
    })
}
