//! Stable per-device identity.
//!
//! The identifier stands in for a user in this account-free system, so it
//! must survive restarts. It is persisted as a plain file; persistence is
//! best-effort — if the write keeps failing, callers get a fresh id per
//! process, which the backend treats as a new device. That weakness is
//! accepted: it degrades to an empty library, not to data loss for anyone
//! else.

use std::path::Path;

/// Load the persisted device id, or generate and persist a new one.
pub fn load_or_create(path: &Path) -> String {
    if let Ok(contents) = std::fs::read_to_string(path) {
        let id = contents.trim();
        if !id.is_empty() {
            return id.to_string();
        }
    }

    let id = uuid::Uuid::now_v7().to_string();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(path, &id) {
        Ok(()) => tracing::info!(path = %path.display(), "device id created"),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to persist device id");
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device-id");

        let first = load_or_create(&path);
        let second = load_or_create(&path);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn blank_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device-id");
        std::fs::write(&path, "  \n").unwrap();

        let id = load_or_create(&path);
        assert!(!id.trim().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), id);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("device-id");

        let id = load_or_create(&path);
        assert_eq!(load_or_create(&path), id);
    }
}
