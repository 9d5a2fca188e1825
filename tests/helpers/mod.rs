#![allow(dead_code)]

use lorebook::client::{ApiClient, CacheStore, SyncClient};
use lorebook::config::LorebookConfig;
use lorebook::server::{router, AppState};
use rusqlite::Connection;
use std::path::Path;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    lorebook::db::schema::init_schema(&conn).unwrap();
    lorebook::db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Spawn the API over a fresh in-memory database on an ephemeral port.
/// Returns the base URL.
pub async fn spawn_server() -> String {
    spawn_server_with_config(LorebookConfig::default()).await
}

pub async fn spawn_server_with_config(config: LorebookConfig) -> String {
    let state = AppState::new(test_conn(), config);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A typed client simulating one device against the given server.
pub fn api_client(base: &str, device: &str) -> ApiClient {
    ApiClient::new(base, device)
}

/// A full sync client with its cache under `cache_dir`.
pub fn sync_client(base: &str, device: &str, cache_dir: &Path) -> SyncClient {
    SyncClient::new(ApiClient::new(base, device), CacheStore::new(cache_dir))
}
