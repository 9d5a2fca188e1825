//! Library persistence: saved knowledge cards and scan results.
//!
//! Items are listed newest-first. Every mutation recomputes the device's
//! derived `items_saved` stat.

use anyhow::Result;
use rusqlite::{params, Connection, Row};

use crate::model::{ItemKind, LibraryItem, NewLibraryItem};
use crate::store::{devices, parse_ts, stats};

/// List the device's library, newest first.
pub fn list_items(conn: &Connection, device_id: &str) -> Result<Vec<LibraryItem>> {
    devices::ensure_device(conn, device_id)?;

    let mut stmt = conn.prepare(
        "SELECT id, kind, title, content, category, thumbnail, fun_fact, created_at \
         FROM library WHERE device_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let items = stmt
        .query_map(params![device_id], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Save a new item with a generated id and timestamp, then sync the derived
/// `items_saved` counter.
pub fn create_item(conn: &Connection, device_id: &str, new: NewLibraryItem) -> Result<LibraryItem> {
    devices::ensure_device(conn, device_id)?;

    let item = LibraryItem::from_new(new, uuid::Uuid::now_v7().to_string(), chrono::Utc::now());
    conn.execute(
        "INSERT INTO library (id, device_id, kind, title, content, category, thumbnail, fun_fact, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            item.id,
            device_id,
            item.kind.as_str(),
            item.title,
            item.content,
            item.category,
            item.thumbnail,
            item.fun_fact,
            item.created_at.to_rfc3339(),
        ],
    )?;

    stats::recompute_items_saved(conn, device_id)?;
    tracing::debug!(device_id, id = %item.id, "library item saved");
    Ok(item)
}

/// Delete one item and return the remaining list, newest first.
pub fn delete_item(conn: &Connection, device_id: &str, id: &str) -> Result<Vec<LibraryItem>> {
    devices::ensure_device(conn, device_id)?;

    conn.execute(
        "DELETE FROM library WHERE id = ?1 AND device_id = ?2",
        params![id, device_id],
    )?;

    stats::recompute_items_saved(conn, device_id)?;
    list_items(conn, device_id)
}

/// Strip inline `data:image` thumbnails (the heavyweight ones). Returns how
/// many rows were affected. URL thumbnails are left alone.
pub fn optimize_images(conn: &Connection, device_id: &str) -> Result<u64> {
    devices::ensure_device(conn, device_id)?;

    let changed = conn.execute(
        "UPDATE library SET thumbnail = NULL WHERE device_id = ?1 AND thumbnail LIKE 'data:image%'",
        params![device_id],
    )?;
    Ok(changed as u64)
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<LibraryItem> {
    let kind: String = row.get(1)?;
    let created_at: String = row.get(7)?;
    Ok(LibraryItem {
        id: row.get(0)?,
        kind: kind.parse().unwrap_or(ItemKind::Card),
        title: row.get(2)?,
        content: row.get(3)?,
        category: row.get(4)?,
        thumbnail: row.get(5)?,
        fun_fact: row.get(6)?,
        created_at: parse_ts(&created_at),
    })
}
