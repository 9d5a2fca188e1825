//! Model-provider proxy.
//!
//! Forwards a single inference request type to the external text/vision
//! provider and normalizes its structured output back into a flat text
//! field. Upstream failures are surfaced with the provider's status and body
//! rather than translated. This is the one endpoint that does not require a
//! device identity.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::AppState;
use crate::wire::{InferenceInput, InferenceRequest, TextEnvelope};

/// Body forwarded to the provider's `/responses` endpoint.
#[derive(Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    input: &'a InferenceInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// The slice of the provider's response we care about. Unknown fields are
/// ignored.
#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

pub async fn create_response(
    State(state): State<AppState>,
    Json(request): Json<InferenceRequest>,
) -> Result<Json<TextEnvelope>, ApiError> {
    let provider = &state.config().provider;
    if provider.api_key.is_empty() {
        return Err(ApiError::MissingProviderKey);
    }

    let model = request.model.as_deref().unwrap_or(&provider.model);
    let body = UpstreamRequest {
        model,
        input: &request.input,
        instructions: request.instructions.as_deref(),
        temperature: request.temperature,
    };

    let url = format!("{}/responses", provider.base_url.trim_end_matches('/'));
    tracing::debug!(model, "forwarding inference request");

    let response = state
        .http()
        .post(&url)
        .bearer_auth(&provider.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("model provider request failed: {e}"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    let data: UpstreamResponse = response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("model provider response unreadable: {e}"))?;

    Ok(Json(TextEnvelope {
        text: extract_output_text(&data).trim().to_string(),
    }))
}

/// Flatten the provider's structured output. Prefers the convenience
/// `output_text` field; otherwise concatenates every `output_text` content
/// block of every `message` output item.
fn extract_output_text(data: &UpstreamResponse) -> String {
    if let Some(text) = &data.output_text {
        return text.clone();
    }
    let mut text = String::new();
    for item in &data.output {
        if item.kind != "message" {
            continue;
        }
        for content in &item.content {
            if content.kind == "output_text" {
                text.push_str(&content.text);
            }
        }
    }
    text
}
