//! Request extractor for the device identity header.
//!
//! The header value itself is the identity; there is no proof of possession.
//! Anything non-empty is accepted, and unknown identifiers are registered
//! lazily by the store layer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::server::error::ApiError;

/// Name of the header carrying the per-device identity.
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// The device identifier extracted from the request headers.
#[derive(Debug, Clone)]
pub struct DeviceId(pub String);

impl<S> FromRequestParts<S> for DeviceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(DEVICE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| DeviceId(value.to_string()))
            .ok_or(ApiError::MissingDevice)
    }
}
