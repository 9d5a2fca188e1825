//! Settings persistence: a singleton JSON row per device.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::decode::decode_json;
use crate::model::Settings;
use crate::store::devices;

const UPSERT_SQL: &str = "INSERT INTO settings (device_id, json, updated_at) VALUES (?1, ?2, ?3) \
     ON CONFLICT(device_id) DO UPDATE SET json = excluded.json, updated_at = excluded.updated_at";

/// Fetch the device's settings, creating the row with defaults on first
/// access. A malformed stored row decodes to defaults.
pub fn get_settings(conn: &Connection, device_id: &str) -> Result<Settings> {
    devices::ensure_device(conn, device_id)?;

    let raw: Option<String> = conn
        .query_row(
            "SELECT json FROM settings WHERE device_id = ?1",
            params![device_id],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        None => {
            let defaults = Settings::default();
            upsert(conn, device_id, &defaults)?;
            Ok(defaults)
        }
        Some(json) => {
            let decoded = decode_json::<Settings>(Some(&json));
            if let Some(reason) = decoded.fallback_reason() {
                tracing::warn!(device_id, %reason, "stored settings unreadable, using defaults");
            }
            Ok(decoded.value_or_default())
        }
    }
}

/// Replace the device's settings wholesale. Partial payloads are already
/// merged with defaults at deserialization time, so the stored row is always
/// complete.
pub fn save_settings(conn: &Connection, device_id: &str, settings: Settings) -> Result<Settings> {
    devices::ensure_device(conn, device_id)?;
    upsert(conn, device_id, &settings)?;
    Ok(settings)
}

fn upsert(conn: &Connection, device_id: &str, settings: &Settings) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let json = serde_json::to_string(settings)?;
    conn.execute(UPSERT_SQL, params![device_id, json, now])?;
    Ok(())
}
