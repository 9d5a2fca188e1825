//! Lazy device registration.
//!
//! There is no registration or auth step: the header value itself is the
//! identity. A device row is inserted the first time an identifier is seen.

use anyhow::Result;
use rusqlite::{params, Connection};

/// Insert a device row if this identifier has never been seen before.
pub fn ensure_device(conn: &Connection, device_id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO devices (id, created_at) VALUES (?1, ?2)",
        params![device_id, now],
    )?;
    Ok(())
}
