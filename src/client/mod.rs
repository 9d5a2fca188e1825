//! Client side: device identity, local cache, remote data service, and the
//! synchronization policy.
//!
//! The backend is authoritative; everything here exists so the UI can render
//! instantly from last-known-good copies and reconcile in the background.

pub mod cache;
pub mod device;
pub mod remote;
pub mod sync;

pub use cache::{CacheStore, EntityKind};
pub use remote::{ApiClient, RemoteError};
pub use sync::SyncClient;
