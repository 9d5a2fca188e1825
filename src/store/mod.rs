//! Backend persistence service: per-entity CRUD over the SQLite database.
//!
//! Every function takes the device identifier explicitly and filters on the
//! `device_id` column; unknown devices are lazily registered on first sight.
//! Stored JSON is decoded defensively — a malformed row yields the entity's
//! defaults, never a hard error.

pub mod devices;
pub mod library;
pub mod sessions;
pub mod settings;
pub mod stats;
pub mod usage;

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp column, falling back to the Unix epoch for
/// values that cannot be parsed (treated like any other malformed stored
/// data).
pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            tracing::debug!(raw, "unparseable stored timestamp, substituting epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ts_handles_both_rfc3339_offsets() {
        assert_eq!(
            parse_ts("2026-01-05T00:00:00Z"),
            parse_ts("2026-01-05T00:00:00+00:00")
        );
    }

    #[test]
    fn parse_ts_falls_back_to_epoch() {
        assert_eq!(parse_ts("1767571200000"), DateTime::<Utc>::UNIX_EPOCH);
    }
}
