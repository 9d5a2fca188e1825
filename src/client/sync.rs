//! Synchronization policy: read-through reads, two-phase optimistic writes,
//! and change notifications.
//!
//! Reads return the cached copy immediately (refreshing in the background) or
//! block on the first fetch, and never fail — an unreachable backend yields
//! the entity's built-in defaults.
//!
//! Writes run in two distinct phases. Phase 1 ([`SyncClient::stage`]) applies
//! the change to the cache optimistically and notifies subscribers. Phase 2
//! commits to the backend: fire-and-forget mutations (settings saves, xp
//! increments) swallow remote failure and keep the optimistic copy; awaited
//! mutations (library and session changes, bulk clears) take the server's
//! response as the new cache content, and on failure restore the pre-stage
//! snapshot before propagating the error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::client::cache::{CacheStore, EntityKind};
use crate::client::remote::{ApiClient, RemoteError};
use crate::decode::Decoded;
use crate::model::{ChatMessage, ChatSession, LibraryItem, NewLibraryItem, Settings, Stats};
use crate::model::{cap_messages, session_preview};

/// Capacity of the change-notification channel. Subscribers that lag simply
/// miss events and re-read on the next one; notifications are re-render
/// hints, not data.
const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Client-side sync layer owning the cache, the remote client, and the
/// change-notification channel.
#[derive(Clone)]
pub struct SyncClient {
    remote: Arc<ApiClient>,
    cache: Arc<CacheStore>,
    changes: broadcast::Sender<EntityKind>,
}

impl SyncClient {
    pub fn new(remote: ApiClient, cache: CacheStore) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            remote: Arc::new(remote),
            cache: Arc::new(cache),
            changes,
        }
    }

    /// Assemble the full client stack from configuration: persistent device
    /// identity and cache files under the configured data directory, remote
    /// calls against the configured API base.
    pub fn from_config(config: &crate::config::LorebookConfig) -> Self {
        let data_dir = config.resolved_data_dir();
        let device_id = crate::client::device::load_or_create(&data_dir.join("device-id"));
        Self::new(
            ApiClient::new(config.client.api_base.clone(), device_id),
            CacheStore::new(data_dir.join("cache")),
        )
    }

    /// Subscribe to cache-change notifications, keyed by entity kind.
    pub fn subscribe(&self) -> broadcast::Receiver<EntityKind> {
        self.changes.subscribe()
    }

    /// Direct access to the remote client, for calls that bypass the cache
    /// (storage breakdown, inference).
    pub fn remote(&self) -> &ApiClient {
        &self.remote
    }

    fn notify(&self, kind: EntityKind) {
        // errors only when there are no subscribers
        let _ = self.changes.send(kind);
    }

    /// Phase 1 of a write: tentative cache apply plus change notification.
    fn stage<T: Serialize>(&self, kind: EntityKind, value: &T) {
        self.cache.write(kind, value);
        self.notify(kind);
    }

    fn snapshot<T: DeserializeOwned>(&self, kind: EntityKind) -> Option<T> {
        match self.cache.read(kind) {
            Decoded::Value(value) => Some(value),
            Decoded::Fallback(_) => None,
        }
    }

    /// Undo a staged write after a failed commit, reinstating the pre-stage
    /// cache content (or its absence).
    fn restore<T: Serialize>(&self, kind: EntityKind, snapshot: Option<T>) {
        match snapshot {
            Some(value) => self.cache.write(kind, &value),
            None => self.cache.remove(kind),
        }
        self.notify(kind);
    }

    /// Patch the cached stats' derived counter after a library mutation and
    /// notify. A client-side echo of the derivation the backend also
    /// performs authoritatively.
    fn echo_items_saved(&self, count: usize) {
        let mut stats: Stats = self.snapshot(EntityKind::Stats).unwrap_or_default();
        stats.items_saved = count as i64;
        self.cache.write(EntityKind::Stats, &stats);
        self.notify(EntityKind::Stats);
    }

    /// Read-through with stale return: a cache hit is returned immediately
    /// while a detached refresh runs; a miss blocks on the fetch and falls
    /// back to `default` if the backend is unreachable.
    async fn read_through<T, F, Fut>(
        &self,
        kind: EntityKind,
        fetch: F,
        default: impl FnOnce() -> T,
    ) -> T
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce(Arc<ApiClient>) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        match self.cache.read::<T>(kind) {
            Decoded::Value(cached) => {
                let refresh = fetch(Arc::clone(&self.remote));
                let cache = Arc::clone(&self.cache);
                let changes = self.changes.clone();
                tokio::spawn(async move {
                    match refresh.await {
                        Ok(fresh) => {
                            cache.write(kind, &fresh);
                            let _ = changes.send(kind);
                        }
                        Err(err) => {
                            tracing::debug!(kind = %kind, %err, "background refresh failed")
                        }
                    }
                });
                cached
            }
            Decoded::Fallback(reason) => {
                tracing::debug!(kind = %kind, %reason, "cache miss, fetching");
                match fetch(Arc::clone(&self.remote)).await {
                    Ok(fresh) => {
                        self.cache.write(kind, &fresh);
                        self.notify(kind);
                        fresh
                    }
                    Err(err) => {
                        tracing::warn!(kind = %kind, %err, "fetch failed, using defaults");
                        default()
                    }
                }
            }
        }
    }

    // --- Reads ---

    pub async fn settings(&self) -> Settings {
        self.read_through(
            EntityKind::Settings,
            |remote| async move { remote.get_settings().await },
            Settings::default,
        )
        .await
    }

    pub async fn stats(&self) -> Stats {
        self.read_through(
            EntityKind::Stats,
            |remote| async move { remote.get_stats().await },
            Stats::default,
        )
        .await
    }

    pub async fn library(&self) -> Vec<LibraryItem> {
        self.read_through(
            EntityKind::Library,
            |remote| async move { remote.list_library().await },
            Vec::new,
        )
        .await
    }

    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.read_through(
            EntityKind::Sessions,
            |remote| async move { remote.list_sessions().await },
            Vec::new,
        )
        .await
    }

    // --- Fire-and-forget writes ---

    /// Save settings. The optimistic copy stands even if the remote call
    /// fails; the next successful refresh reconciles.
    pub fn save_settings(&self, settings: Settings) {
        self.stage(EntityKind::Settings, &settings);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(err) = remote.save_settings(&settings).await {
                tracing::warn!(%err, "settings save failed, keeping optimistic copy");
            }
        });
    }

    /// Add experience points, optimistically bumping the cached counter.
    pub fn add_xp(&self, amount: i64) {
        let mut stats: Stats = self.snapshot(EntityKind::Stats).unwrap_or_default();
        stats.xp += amount;
        self.stage(EntityKind::Stats, &stats);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(err) = remote.add_xp(amount).await {
                tracing::warn!(%err, amount, "xp update failed, keeping optimistic copy");
            }
        });
    }

    // --- Awaited writes ---

    /// Save an item to the library. The staged entry carries a provisional
    /// id; the server's item replaces it on commit.
    pub async fn save_to_library(&self, new_item: NewLibraryItem) -> Result<LibraryItem, RemoteError> {
        let snapshot: Option<Vec<LibraryItem>> = self.snapshot(EntityKind::Library);

        let provisional = LibraryItem::from_new(
            new_item.clone(),
            uuid::Uuid::now_v7().to_string(),
            chrono::Utc::now(),
        );
        let mut staged = snapshot.clone().unwrap_or_default();
        staged.insert(0, provisional);
        self.stage(EntityKind::Library, &staged);

        match self.remote.create_library_item(&new_item).await {
            Ok(item) => {
                let mut items = snapshot.unwrap_or_default();
                items.insert(0, item.clone());
                self.cache.write(EntityKind::Library, &items);
                self.notify(EntityKind::Library);
                self.echo_items_saved(items.len());
                Ok(item)
            }
            Err(err) => {
                self.restore(EntityKind::Library, snapshot);
                Err(err)
            }
        }
    }

    /// Delete a library item. Returns the server's remaining list.
    pub async fn delete_from_library(&self, id: &str) -> Result<Vec<LibraryItem>, RemoteError> {
        let snapshot: Option<Vec<LibraryItem>> = self.snapshot(EntityKind::Library);

        if let Some(items) = &snapshot {
            let staged: Vec<LibraryItem> =
                items.iter().filter(|item| item.id != id).cloned().collect();
            self.stage(EntityKind::Library, &staged);
        }

        match self.remote.delete_library_item(id).await {
            Ok(items) => {
                self.cache.write(EntityKind::Library, &items);
                self.notify(EntityKind::Library);
                self.echo_items_saved(items.len());
                Ok(items)
            }
            Err(err) => {
                self.restore(EntityKind::Library, snapshot);
                Err(err)
            }
        }
    }

    /// Start a new conversation. The staged session carries a provisional
    /// id; the server's session replaces it on commit.
    pub async fn create_session(&self, first_message_text: &str) -> Result<ChatSession, RemoteError> {
        let snapshot: Option<Vec<ChatSession>> = self.snapshot(EntityKind::Sessions);

        let provisional = ChatSession::from_first_message(
            first_message_text,
            uuid::Uuid::now_v7().to_string(),
            chrono::Utc::now(),
        );
        let mut staged = snapshot.clone().unwrap_or_default();
        staged.insert(0, provisional);
        self.stage(EntityKind::Sessions, &staged);

        match self.remote.create_session(first_message_text).await {
            Ok(session) => {
                let mut sessions = snapshot.unwrap_or_default();
                sessions.insert(0, session.clone());
                self.cache.write(EntityKind::Sessions, &sessions);
                self.notify(EntityKind::Sessions);
                Ok(session)
            }
            Err(err) => {
                self.restore(EntityKind::Sessions, snapshot);
                Err(err)
            }
        }
    }

    /// Replace a session's message list. The staged copy mirrors the
    /// server-side derivations (cap, preview, recency) so the UI does not
    /// flicker when the refresh lands.
    pub async fn update_session(
        &self,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<(), RemoteError> {
        let snapshot: Option<Vec<ChatSession>> = self.snapshot(EntityKind::Sessions);

        if let Some(sessions) = &snapshot {
            let mut staged = sessions.clone();
            if let Some(session) = staged.iter_mut().find(|s| s.id == id) {
                session.messages = cap_messages(messages.clone());
                if let Some(last) = session.messages.last() {
                    session.preview = session_preview(&last.text);
                }
                session.updated_at = chrono::Utc::now();
            }
            staged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            self.stage(EntityKind::Sessions, &staged);
        }

        match self.remote.update_session(id, &messages).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.restore(EntityKind::Sessions, snapshot);
                Err(err)
            }
        }
    }

    /// Delete one session. Returns the server's remaining list.
    pub async fn delete_session(&self, id: &str) -> Result<Vec<ChatSession>, RemoteError> {
        let snapshot: Option<Vec<ChatSession>> = self.snapshot(EntityKind::Sessions);

        if let Some(sessions) = &snapshot {
            let staged: Vec<ChatSession> =
                sessions.iter().filter(|s| s.id != id).cloned().collect();
            self.stage(EntityKind::Sessions, &staged);
        }

        match self.remote.delete_session(id).await {
            Ok(sessions) => {
                self.cache.write(EntityKind::Sessions, &sessions);
                self.notify(EntityKind::Sessions);
                Ok(sessions)
            }
            Err(err) => {
                self.restore(EntityKind::Sessions, snapshot);
                Err(err)
            }
        }
    }

    /// Delete every session.
    pub async fn clear_sessions(&self) -> Result<(), RemoteError> {
        let snapshot: Option<Vec<ChatSession>> = self.snapshot(EntityKind::Sessions);
        self.stage(EntityKind::Sessions, &Vec::<ChatSession>::new());

        match self.remote.clear_sessions().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.restore(EntityKind::Sessions, snapshot);
                Err(err)
            }
        }
    }

    /// Strip inline image thumbnails server-side, then refresh the cached
    /// library so the UI reflects the slimmer items.
    pub async fn optimize_images(&self) -> Result<u64, RemoteError> {
        let optimized = self.remote.optimize_images().await?;
        let items = self.remote.list_library().await?;
        self.cache.write(EntityKind::Library, &items);
        self.notify(EntityKind::Library);
        Ok(optimized)
    }

    /// Wipe every entity for this device, resetting the cache to defaults.
    pub async fn wipe_all(&self) -> Result<(), RemoteError> {
        let settings: Option<Settings> = self.snapshot(EntityKind::Settings);
        let stats: Option<Stats> = self.snapshot(EntityKind::Stats);
        let library: Option<Vec<LibraryItem>> = self.snapshot(EntityKind::Library);
        let sessions: Option<Vec<ChatSession>> = self.snapshot(EntityKind::Sessions);

        self.stage(EntityKind::Settings, &Settings::default());
        self.stage(EntityKind::Stats, &Stats::default());
        self.stage(EntityKind::Library, &Vec::<LibraryItem>::new());
        self.stage(EntityKind::Sessions, &Vec::<ChatSession>::new());

        match self.remote.wipe_all().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.restore(EntityKind::Settings, settings);
                self.restore(EntityKind::Stats, stats);
                self.restore(EntityKind::Library, library);
                self.restore(EntityKind::Sessions, sessions);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Theme;

    /// A sync client whose remote points at a port nothing listens on.
    fn offline_client() -> (tempfile::TempDir, SyncClient) {
        let dir = tempfile::tempdir().unwrap();
        let client = SyncClient::new(
            ApiClient::new("http://127.0.0.1:9", "test-device"),
            CacheStore::new(dir.path()),
        );
        (dir, client)
    }

    #[tokio::test]
    async fn from_config_pins_a_stable_device_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::config::LorebookConfig::default();
        config.client.data_dir = dir.path().to_string_lossy().into_owned();
        config.client.api_base = "http://127.0.0.1:9".into();

        let first = SyncClient::from_config(&config);
        let second = SyncClient::from_config(&config);
        assert_eq!(first.remote().device_id(), second.remote().device_id());
        assert!(dir.path().join("device-id").exists());
    }

    #[tokio::test]
    async fn unreachable_backend_with_no_cache_yields_defaults() {
        let (_dir, client) = offline_client();
        let settings = client.settings().await;
        assert_eq!(settings, Settings::default());

        let stats = client.stats().await;
        assert_eq!(stats.xp, 0);
        assert!(client.library().await.is_empty());
        assert!(client.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn cached_value_is_returned_when_backend_is_down() {
        let (_dir, client) = offline_client();
        let mut settings = Settings::default();
        settings.theme = Theme::Ink;
        client.cache.write(EntityKind::Settings, &settings);

        assert_eq!(client.settings().await.theme, Theme::Ink);
    }

    #[tokio::test]
    async fn fire_and_forget_save_keeps_optimistic_copy_on_failure() {
        let (_dir, client) = offline_client();
        let mut settings = Settings::default();
        settings.theme = Theme::Dark;

        client.save_settings(settings);
        // the failed remote call must not roll the cache back
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(client.settings().await.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn add_xp_stages_optimistically_without_a_cached_row() {
        let (_dir, client) = offline_client();
        client.add_xp(15);
        client.add_xp(15);

        let stats: Stats = client.snapshot(EntityKind::Stats).unwrap();
        assert_eq!(stats.xp, 30);
    }

    #[tokio::test]
    async fn failed_library_save_rolls_back_and_propagates() {
        let (_dir, client) = offline_client();
        let existing = LibraryItem::from_new(
            NewLibraryItem {
                title: "kept".into(),
                ..NewLibraryItem::default()
            },
            "existing-id".into(),
            chrono::Utc::now(),
        );
        client.cache.write(EntityKind::Library, &vec![existing.clone()]);

        let mut events = client.subscribe();
        let result = client
            .save_to_library(NewLibraryItem {
                title: "doomed".into(),
                ..NewLibraryItem::default()
            })
            .await;
        assert!(result.is_err());

        // optimistic notification first, rollback notification second
        assert_eq!(events.try_recv().unwrap(), EntityKind::Library);
        assert_eq!(events.try_recv().unwrap(), EntityKind::Library);

        let items: Vec<LibraryItem> = client.snapshot(EntityKind::Library).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, existing.id);
    }

    #[tokio::test]
    async fn failed_save_with_empty_cache_restores_the_miss() {
        let (_dir, client) = offline_client();
        let result = client.save_to_library(NewLibraryItem::default()).await;
        assert!(result.is_err());
        assert!(client.snapshot::<Vec<LibraryItem>>(EntityKind::Library).is_none());
    }

    #[tokio::test]
    async fn failed_wipe_restores_every_snapshot() {
        let (_dir, client) = offline_client();
        let mut settings = Settings::default();
        settings.theme = Theme::Ink;
        client.cache.write(EntityKind::Settings, &settings);
        let mut stats = Stats::default();
        stats.xp = 42;
        client.cache.write(EntityKind::Stats, &stats);

        assert!(client.wipe_all().await.is_err());

        assert_eq!(client.settings().await.theme, Theme::Ink);
        let restored: Stats = client.snapshot(EntityKind::Stats).unwrap();
        assert_eq!(restored.xp, 42);
    }

    #[tokio::test]
    async fn staged_session_update_mirrors_server_derivations() {
        let (_dir, client) = offline_client();
        let session = ChatSession::from_first_message("hello", "s1".into(), chrono::Utc::now());
        client.cache.write(EntityKind::Sessions, &vec![session]);

        let messages: Vec<ChatMessage> = (0..150)
            .map(|n| ChatMessage {
                id: format!("m{n}"),
                role: crate::model::Role::User,
                text: format!("msg {n}"),
                timestamp: chrono::Utc::now(),
                is_error: None,
            })
            .collect();
        // remote fails, but the staged copy is what we inspect before rollback
        let snapshot_before: Vec<ChatSession> = client.snapshot(EntityKind::Sessions).unwrap();
        let result = client.update_session("s1", messages).await;
        assert!(result.is_err());

        // rolled back to the pre-stage snapshot
        let after: Vec<ChatSession> = client.snapshot(EntityKind::Sessions).unwrap();
        assert_eq!(after[0].messages.len(), snapshot_before[0].messages.len());
    }
}
