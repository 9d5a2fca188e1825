//! Request and response envelope types for the HTTP API.
//!
//! Shared by the server handlers and the client's remote data service so the
//! two sides cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::model::{ChatMessage, ChatSession, LibraryItem, NewLibraryItem, Settings, Stats};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsEnvelope {
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSettingsRequest {
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsEnvelope {
    pub stats: Stats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddXpRequest {
    #[serde(default)]
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsEnvelope {
    pub sessions: Vec<ChatSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub session: ChatSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub first_message_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsEnvelope {
    pub items: Vec<LibraryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEnvelope {
    pub item: LibraryItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub item: NewLibraryItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedEnvelope {
    pub optimized: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownEnvelope {
    pub breakdown: StorageBreakdown,
}

/// Per-collection serialized sizes, reported as one-decimal kilobyte strings
/// for direct display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBreakdown {
    pub library_size: String,
    pub library_count: u64,
    pub sessions_size: String,
    pub sessions_count: u64,
    pub system_size: String,
    pub total_size: String,
}

/// Inference input: either a bare prompt string or structured content items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InferenceInput {
    Text(String),
    Items(Vec<InputItem>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputItem {
    pub role: String,
    pub content: Vec<InputContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputContent {
    InputText { text: String },
    InputImage { image_url: String },
}

/// A model-inference request, forwarded to the upstream provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub input: InferenceInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEnvelope {
    pub text: String,
}
