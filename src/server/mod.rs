//! HTTP surface: shared state, router, and the serve entry point.
//!
//! Handlers run their database work on the blocking pool; the single
//! [`rusqlite::Connection`] behind a mutex is plenty for one request at a
//! time per device, which is all this workload produces.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod inference;

use anyhow::Result;
use axum::routing::{delete, get, post, put};
use axum::Router;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::config::LorebookConfig;
use crate::db;
use crate::server::error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    http: reqwest::Client,
    config: Arc<LorebookConfig>,
}

impl AppState {
    pub fn new(conn: Connection, config: LorebookConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            http: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }

    /// Run synchronous database work on the blocking pool.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&conn)
        })
        .await
        .map_err(|e| anyhow::anyhow!("db task failed: {e}"))??;
        Ok(result)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn config(&self) -> &LorebookConfig {
        &self.config
    }
}

/// Build the API router. The app serves a browser client from another
/// origin during development, so CORS is wide open.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::save_settings),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/stats/xp", post(handlers::add_xp))
        .route(
            "/api/sessions",
            get(handlers::list_sessions)
                .post(handlers::create_session)
                .delete(handlers::clear_sessions),
        )
        .route(
            "/api/sessions/{id}",
            put(handlers::update_session).delete(handlers::delete_session),
        )
        .route(
            "/api/library",
            get(handlers::list_library).post(handlers::create_library_item),
        )
        .route("/api/library/optimize-images", post(handlers::optimize_images))
        .route("/api/library/{id}", delete(handlers::delete_library_item))
        .route("/api/storage/breakdown", get(handlers::storage_breakdown))
        .route("/api/all", delete(handlers::wipe_all))
        .route("/api/ai/responses", post(inference::create_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Open the database and serve the API until ctrl-c.
pub async fn serve(config: LorebookConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(conn, config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
