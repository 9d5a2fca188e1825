//! Axum handlers for the device-scoped CRUD endpoints.
//!
//! Each handler extracts the device identity, runs the matching store
//! function on the blocking pool, and wraps the result in its envelope type.

use axum::extract::{Path, State};
use axum::Json;

use crate::server::error::ApiError;
use crate::server::extract::DeviceId;
use crate::server::AppState;
use crate::store;
use crate::wire::{
    AddXpRequest, BreakdownEnvelope, CreateItemRequest, CreateSessionRequest, ItemEnvelope,
    ItemsEnvelope, OkEnvelope, OptimizedEnvelope, SaveSettingsRequest, SessionEnvelope,
    SessionsEnvelope, SettingsEnvelope, StatsEnvelope, UpdateSessionRequest,
};

// --- Settings ---

pub async fn get_settings(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<SettingsEnvelope>, ApiError> {
    let settings = state
        .with_db(move |conn| store::settings::get_settings(conn, &device))
        .await?;
    Ok(Json(SettingsEnvelope { settings }))
}

pub async fn save_settings(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Json(body): Json<SaveSettingsRequest>,
) -> Result<Json<SettingsEnvelope>, ApiError> {
    let settings = state
        .with_db(move |conn| store::settings::save_settings(conn, &device, body.settings))
        .await?;
    Ok(Json(SettingsEnvelope { settings }))
}

// --- Stats ---

pub async fn get_stats(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<StatsEnvelope>, ApiError> {
    let stats = state
        .with_db(move |conn| store::stats::get_stats(conn, &device))
        .await?;
    Ok(Json(StatsEnvelope { stats }))
}

pub async fn add_xp(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Json(body): Json<AddXpRequest>,
) -> Result<Json<StatsEnvelope>, ApiError> {
    let stats = state
        .with_db(move |conn| store::stats::add_xp(conn, &device, body.amount))
        .await?;
    Ok(Json(StatsEnvelope { stats }))
}

// --- Sessions ---

pub async fn list_sessions(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<SessionsEnvelope>, ApiError> {
    let sessions = state
        .with_db(move |conn| store::sessions::list_sessions(conn, &device))
        .await?;
    Ok(Json(SessionsEnvelope { sessions }))
}

pub async fn create_session(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<SessionEnvelope>, ApiError> {
    let session = state
        .with_db(move |conn| {
            store::sessions::create_session(conn, &device, &body.first_message_text)
        })
        .await?;
    Ok(Json(SessionEnvelope { session }))
}

pub async fn update_session(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Path(id): Path<String>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<OkEnvelope>, ApiError> {
    state
        .with_db(move |conn| store::sessions::update_session(conn, &device, &id, body.messages))
        .await?;
    Ok(Json(OkEnvelope { ok: true }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Path(id): Path<String>,
) -> Result<Json<SessionsEnvelope>, ApiError> {
    let sessions = state
        .with_db(move |conn| store::sessions::delete_session(conn, &device, &id))
        .await?;
    Ok(Json(SessionsEnvelope { sessions }))
}

pub async fn clear_sessions(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<OkEnvelope>, ApiError> {
    state
        .with_db(move |conn| store::sessions::clear_sessions(conn, &device))
        .await?;
    Ok(Json(OkEnvelope { ok: true }))
}

// --- Library ---

pub async fn list_library(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<ItemsEnvelope>, ApiError> {
    let items = state
        .with_db(move |conn| store::library::list_items(conn, &device))
        .await?;
    Ok(Json(ItemsEnvelope { items }))
}

pub async fn create_library_item(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Json(body): Json<CreateItemRequest>,
) -> Result<Json<ItemEnvelope>, ApiError> {
    let item = state
        .with_db(move |conn| store::library::create_item(conn, &device, body.item))
        .await?;
    Ok(Json(ItemEnvelope { item }))
}

pub async fn delete_library_item(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
    Path(id): Path<String>,
) -> Result<Json<ItemsEnvelope>, ApiError> {
    let items = state
        .with_db(move |conn| store::library::delete_item(conn, &device, &id))
        .await?;
    Ok(Json(ItemsEnvelope { items }))
}

pub async fn optimize_images(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<OptimizedEnvelope>, ApiError> {
    let optimized = state
        .with_db(move |conn| store::library::optimize_images(conn, &device))
        .await?;
    Ok(Json(OptimizedEnvelope { optimized }))
}

// --- Storage ---

pub async fn storage_breakdown(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<BreakdownEnvelope>, ApiError> {
    let breakdown = state
        .with_db(move |conn| store::usage::storage_breakdown(conn, &device))
        .await?;
    Ok(Json(BreakdownEnvelope { breakdown }))
}

pub async fn wipe_all(
    State(state): State<AppState>,
    DeviceId(device): DeviceId,
) -> Result<Json<OkEnvelope>, ApiError> {
    state
        .with_db(move |conn| store::usage::wipe_device(conn, &device))
        .await?;
    Ok(Json(OkEnvelope { ok: true }))
}
