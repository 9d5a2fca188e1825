//! Remote data service: a typed client for the HTTP API.
//!
//! An [`ApiClient`] is constructed with the backend base URL and an explicit
//! device identifier — no ambient global — so tests can simulate several
//! devices against one server in a single process. Every call attaches the
//! identity header; non-success statuses become [`RemoteError::Status`]. No
//! automatic retries: callers decide whether to surface failure or fall back
//! to cache.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{ChatMessage, ChatSession, LibraryItem, NewLibraryItem, Settings, Stats};
use crate::server::extract::DEVICE_ID_HEADER;
use crate::wire::{
    AddXpRequest, BreakdownEnvelope, CreateItemRequest, CreateSessionRequest, InferenceRequest,
    ItemEnvelope, ItemsEnvelope, OkEnvelope, OptimizedEnvelope, SaveSettingsRequest,
    SessionEnvelope, SessionsEnvelope, SettingsEnvelope, StatsEnvelope, StorageBreakdown,
    TextEnvelope, UpdateSessionRequest,
};

/// Failure modes of a remote call.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (connection refused, timeout, bad URL,
    /// unreadable response body).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Typed HTTP client for one device's view of the backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    device_id: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .header(DEVICE_ID_HEADER, self.device_id.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self.send(request.json(body)).await?;
        Ok(response.json().await?)
    }

    // --- Settings ---

    pub async fn get_settings(&self) -> Result<Settings, RemoteError> {
        let envelope: SettingsEnvelope = self.get_json("/api/settings").await?;
        Ok(envelope.settings)
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<Settings, RemoteError> {
        let request = SaveSettingsRequest {
            settings: settings.clone(),
        };
        let envelope: SettingsEnvelope = self
            .send_json(self.http.put(self.url("/api/settings")), &request)
            .await?;
        Ok(envelope.settings)
    }

    // --- Stats ---

    pub async fn get_stats(&self) -> Result<Stats, RemoteError> {
        let envelope: StatsEnvelope = self.get_json("/api/stats").await?;
        Ok(envelope.stats)
    }

    pub async fn add_xp(&self, amount: i64) -> Result<Stats, RemoteError> {
        let envelope: StatsEnvelope = self
            .send_json(self.http.post(self.url("/api/stats/xp")), &AddXpRequest { amount })
            .await?;
        Ok(envelope.stats)
    }

    // --- Sessions ---

    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, RemoteError> {
        let envelope: SessionsEnvelope = self.get_json("/api/sessions").await?;
        Ok(envelope.sessions)
    }

    pub async fn create_session(
        &self,
        first_message_text: &str,
    ) -> Result<ChatSession, RemoteError> {
        let request = CreateSessionRequest {
            first_message_text: first_message_text.to_string(),
        };
        let envelope: SessionEnvelope = self
            .send_json(self.http.post(self.url("/api/sessions")), &request)
            .await?;
        Ok(envelope.session)
    }

    pub async fn update_session(
        &self,
        id: &str,
        messages: &[ChatMessage],
    ) -> Result<(), RemoteError> {
        let request = UpdateSessionRequest {
            messages: messages.to_vec(),
        };
        let _: OkEnvelope = self
            .send_json(self.http.put(self.url(&format!("/api/sessions/{id}"))), &request)
            .await?;
        Ok(())
    }

    pub async fn delete_session(&self, id: &str) -> Result<Vec<ChatSession>, RemoteError> {
        let response = self
            .send(self.http.delete(self.url(&format!("/api/sessions/{id}"))))
            .await?;
        let envelope: SessionsEnvelope = response.json().await?;
        Ok(envelope.sessions)
    }

    pub async fn clear_sessions(&self) -> Result<(), RemoteError> {
        let response = self.send(self.http.delete(self.url("/api/sessions"))).await?;
        let _: OkEnvelope = response.json().await?;
        Ok(())
    }

    // --- Library ---

    pub async fn list_library(&self) -> Result<Vec<LibraryItem>, RemoteError> {
        let envelope: ItemsEnvelope = self.get_json("/api/library").await?;
        Ok(envelope.items)
    }

    pub async fn create_library_item(
        &self,
        item: &NewLibraryItem,
    ) -> Result<LibraryItem, RemoteError> {
        let request = CreateItemRequest { item: item.clone() };
        let envelope: ItemEnvelope = self
            .send_json(self.http.post(self.url("/api/library")), &request)
            .await?;
        Ok(envelope.item)
    }

    pub async fn delete_library_item(&self, id: &str) -> Result<Vec<LibraryItem>, RemoteError> {
        let response = self
            .send(self.http.delete(self.url(&format!("/api/library/{id}"))))
            .await?;
        let envelope: ItemsEnvelope = response.json().await?;
        Ok(envelope.items)
    }

    pub async fn optimize_images(&self) -> Result<u64, RemoteError> {
        let response = self
            .send(self.http.post(self.url("/api/library/optimize-images")))
            .await?;
        let envelope: OptimizedEnvelope = response.json().await?;
        Ok(envelope.optimized)
    }

    // --- Storage ---

    pub async fn storage_breakdown(&self) -> Result<StorageBreakdown, RemoteError> {
        let envelope: BreakdownEnvelope = self.get_json("/api/storage/breakdown").await?;
        Ok(envelope.breakdown)
    }

    pub async fn wipe_all(&self) -> Result<(), RemoteError> {
        let response = self.send(self.http.delete(self.url("/api/all"))).await?;
        let _: OkEnvelope = response.json().await?;
        Ok(())
    }

    // --- Inference ---

    /// Proxy an inference request through the backend. Returns the flattened
    /// text answer.
    pub async fn model_response(&self, request: &InferenceRequest) -> Result<String, RemoteError> {
        let envelope: TextEnvelope = self
            .send_json(self.http.post(self.url("/api/ai/responses")), request)
            .await?;
        Ok(envelope.text)
    }
}
