//! Defensive parse-or-default JSON decoding.
//!
//! Stored payloads (database rows, client cache files) are never trusted to be
//! well-formed. [`decode_json`] returns a [`Decoded`] sum type instead of
//! silently swallowing errors, so callers can log the reason and tests can
//! assert on which path was taken.

use serde::de::DeserializeOwned;

/// Why a decode fell back instead of producing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No stored payload exists.
    Missing,
    /// The payload could not be read at all (e.g. I/O error).
    Unreadable(String),
    /// The payload was read but is not valid JSON for the target type.
    Malformed(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Unreadable(err) => write!(f, "unreadable: {err}"),
            Self::Malformed(err) => write!(f, "malformed: {err}"),
        }
    }
}

/// Outcome of decoding a stored payload: either the typed value, or the
/// reason the caller should substitute a default.
#[derive(Debug, Clone)]
pub enum Decoded<T> {
    Value(T),
    Fallback(FallbackReason),
}

impl<T> Decoded<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Self::Value(_) => None,
            Self::Fallback(reason) => Some(reason),
        }
    }

    /// Unwrap the value, substituting the result of `default` on fallback.
    pub fn value_or_else(self, default: impl FnOnce() -> T) -> T {
        match self {
            Self::Value(value) => value,
            Self::Fallback(_) => default(),
        }
    }
}

impl<T: Default> Decoded<T> {
    pub fn value_or_default(self) -> T {
        self.value_or_else(T::default)
    }
}

/// Decode an optional raw JSON string into `T`.
///
/// `None` (no stored payload) and parse failures both produce a
/// [`Decoded::Fallback`]; this function never panics and never errors.
pub fn decode_json<T: DeserializeOwned>(raw: Option<&str>) -> Decoded<T> {
    match raw {
        None => Decoded::Fallback(FallbackReason::Missing),
        Some(json) => match serde_json::from_str(json) {
            Ok(value) => Decoded::Value(value),
            Err(err) => Decoded::Fallback(FallbackReason::Malformed(err.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Settings, Stats, Theme};

    #[test]
    fn decodes_valid_payload() {
        let decoded: Decoded<Settings> =
            decode_json(Some(r#"{"theme":"dark","privacy":{"clearOnExit":true}}"#));
        match decoded {
            Decoded::Value(settings) => {
                assert_eq!(settings.theme, Theme::Dark);
                assert!(settings.privacy.clear_on_exit);
                // omitted sections fill in from defaults
                assert!(settings.notifications.daily_fact);
            }
            Decoded::Fallback(reason) => panic!("unexpected fallback: {reason}"),
        }
    }

    #[test]
    fn missing_payload_falls_back() {
        let decoded: Decoded<Stats> = decode_json(None);
        assert_eq!(decoded.fallback_reason(), Some(&FallbackReason::Missing));
    }

    #[test]
    fn malformed_payload_falls_back_with_reason() {
        let decoded: Decoded<Stats> = decode_json(Some("{not json"));
        assert!(decoded.is_fallback());
        assert!(matches!(
            decoded.fallback_reason(),
            Some(FallbackReason::Malformed(_))
        ));
    }

    #[test]
    fn wrong_shape_is_malformed_not_panic() {
        let decoded: Decoded<Stats> = decode_json(Some(r#"{"daysActive":"three"}"#));
        assert!(decoded.is_fallback());
    }

    #[test]
    fn value_or_default_substitutes_on_fallback() {
        let settings: Settings = decode_json::<Settings>(Some("oops")).value_or_default();
        assert_eq!(settings, Settings::default());
    }
}
