//! Local cache of last-known-good entity copies.
//!
//! One JSON file per entity kind under a cache directory. Reads never fail —
//! missing, unreadable, or malformed files are all reported as a
//! [`Decoded::Fallback`] and the caller substitutes defaults. Writes are
//! best-effort: a full disk makes the app slower (extra round trips), not
//! broken.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::decode::{decode_json, Decoded, FallbackReason};

/// The four cached entity kinds, used both as cache namespaces and as change
/// notification keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Settings,
    Stats,
    Library,
    Sessions,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Stats => "stats",
            Self::Library => "library",
            Self::Sessions => "sessions",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-backed key/value cache, namespaced per entity kind.
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(err) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), %err, "failed to create cache directory");
        }
        Self { dir }
    }

    fn path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }

    /// Read the cached copy. Never fails; the result says whether a usable
    /// value was found and, if not, why.
    pub fn read<T: DeserializeOwned>(&self, kind: EntityKind) -> Decoded<T> {
        match std::fs::read_to_string(self.path(kind)) {
            Ok(raw) => decode_json(Some(&raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Decoded::Fallback(FallbackReason::Missing)
            }
            Err(err) => Decoded::Fallback(FallbackReason::Unreadable(err.to_string())),
        }
    }

    /// Overwrite the cached copy. Failures are logged and swallowed.
    pub fn write<T: Serialize>(&self, kind: EntityKind, value: &T) {
        let path = self.path(kind);
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(&path, bytes) {
                    tracing::warn!(path = %path.display(), %err, "cache write failed");
                }
            }
            Err(err) => tracing::warn!(kind = %kind, %err, "cache serialization failed"),
        }
    }

    /// Drop the cached copy. Best-effort.
    pub fn remove(&self, kind: EntityKind) {
        let _ = std::fs::remove_file(self.path(kind));
    }
}
