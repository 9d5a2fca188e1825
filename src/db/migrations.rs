//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        match next {
            2 => migrate_v1_to_v2(conn)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }

        update_schema_version(conn, next)?;
        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: rewrite epoch-millisecond timestamps as RFC 3339.
///
/// Databases imported from the JS-era backend stored `library.created_at` and
/// `sessions.updated_at` as epoch milliseconds, which breaks the text-based
/// newest-first ordering.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    rewrite_epoch_column(conn, "library", "created_at")?;
    rewrite_epoch_column(conn, "sessions", "updated_at")?;
    Ok(())
}

/// Rewrite all-digit (epoch millisecond) values in a timestamp column.
/// RFC 3339 values contain `-`, so they are left untouched.
fn rewrite_epoch_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {column} FROM {table} WHERE {column} NOT LIKE '%-%'"
    ))?;
    let rows: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    for (id, raw) in rows {
        let Ok(millis) = raw.parse::<i64>() else {
            tracing::warn!(table, column, id, raw, "unparseable legacy timestamp, skipping");
            continue;
        };
        if let Some(ts) = DateTime::<Utc>::from_timestamp_millis(millis) {
            conn.execute(
                &format!("UPDATE {table} SET {column} = ?1 WHERE id = ?2"),
                params![ts.to_rfc3339(), id],
            )?;
        }
    }
    Ok(())
}
