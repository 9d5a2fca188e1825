//! The error surface of the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors a handler can surface to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The required `x-device-id` header is absent or empty.
    #[error("missing x-device-id header")]
    MissingDevice,

    /// The inference proxy is not configured with a provider API key.
    #[error("model provider API key is not configured")]
    MissingProviderKey,

    /// The upstream model provider rejected the request. Forwarded verbatim:
    /// the status and body reach the client untranslated.
    #[error("model provider returned HTTP {status}")]
    Upstream { status: u16, body: String },

    /// Anything else. Details are logged, not leaked.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingDevice => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            ApiError::MissingProviderKey => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            ApiError::Upstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, body).into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                    .into_response()
            }
        }
    }
}
