//! SQL DDL for all Lorebook tables.
//!
//! One logical table per entity kind, every row scoped by a `device_id`
//! column. Settings and stats are singleton rows storing the whole entity as
//! one JSON column; sessions store their message list as JSON. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for Lorebook's tables.
const SCHEMA_SQL: &str = r#"
-- One row per device ever seen
CREATE TABLE IF NOT EXISTS devices (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Singleton settings per device, whole entity as JSON
CREATE TABLE IF NOT EXISTS settings (
    device_id TEXT PRIMARY KEY REFERENCES devices(id) ON DELETE CASCADE,
    json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Singleton stats per device, whole entity as JSON
CREATE TABLE IF NOT EXISTS stats (
    device_id TEXT PRIMARY KEY REFERENCES devices(id) ON DELETE CASCADE,
    json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Chat sessions, message list as JSON
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    device_id TEXT NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    preview TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    messages_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_device_updated ON sessions(device_id, updated_at DESC);

-- Saved knowledge cards and scan results
CREATE TABLE IF NOT EXISTS library (
    id TEXT PRIMARY KEY,
    device_id TEXT NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK(kind IN ('scan','card')),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT NOT NULL,
    thumbnail TEXT,
    fun_fact TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_library_device_created ON library(device_id, created_at DESC);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
