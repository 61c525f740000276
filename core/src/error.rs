//! Error types for the SnapCar platform client.
//!
//! # Design
//! Three families matter to callers. `Config` and `InvalidParameters` are
//! produced while a request is being built, before the transport is touched.
//! `Api` covers everything that happened on the wire: a non-2xx status, an
//! unreadable error body, or a transport that never got a response. The
//! polling variants only appear when a caller bounds or cancels dispatch
//! polling.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

/// Message key used when the server gave nothing more specific.
pub const OTHER: &str = "other";

/// A failure reported by the API or by the transport underneath it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("API error {code}: {message}")]
pub struct ApiError {
    /// HTTP status code, or 0 when no response was received.
    pub code: u16,
    /// Machine-readable key such as `no_driver` or `invalid_token`.
    pub message: String,
    /// Structured details, e.g. the list of invalid fields.
    pub details: Option<Value>,
    /// Raw response body, kept for diagnostics.
    pub server_response: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    details: Option<Value>,
}

impl ApiError {
    /// Interpret a non-2xx response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let server_response = (!body.is_empty()).then(|| body.to_string());
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self {
                code: parsed.code.unwrap_or(status),
                message: parsed.message.unwrap_or_else(|| OTHER.to_string()),
                details: parsed.details,
                server_response,
            },
            Err(_) => Self {
                code: status,
                message: OTHER.to_string(),
                details: None,
                server_response,
            },
        }
    }

    /// A request that never produced a response.
    pub fn transport(error: &TransportError) -> Self {
        Self {
            code: 0,
            message: OTHER.to_string(),
            details: None,
            server_response: Some(error.to_string()),
        }
    }
}

/// Errors returned by every client and platform operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The client is not configured to issue requests (e.g. no token).
    #[error("configuration error ({key}): {description}")]
    Config {
        key: &'static str,
        description: &'static str,
    },

    /// The inputs of a call failed a precondition.
    #[error("invalid parameters ({key}): {description}")]
    InvalidParameters {
        key: &'static str,
        description: &'static str,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Dispatch polling was stopped through its cancel handle.
    #[error("dispatch polling cancelled after {attempts} poll(s)")]
    PollingCancelled { attempts: u32 },

    /// Dispatch polling hit one of its configured bounds.
    #[error("dispatch polling gave up after {attempts} poll(s)")]
    PollingExhausted {
        attempts: u32,
        last_error: Option<Box<Error>>,
    },
}

impl Error {
    pub(crate) fn missing_token() -> Self {
        Error::Config {
            key: "missing_token",
            description: "You have to provide a SnapCar API token in order to perform API calls.",
        }
    }

    pub(crate) fn invalid(key: &'static str, description: &'static str) -> Self {
        Error::InvalidParameters { key, description }
    }

    /// Machine-readable key, whatever the variant.
    pub fn key(&self) -> &str {
        match self {
            Error::Config { key, .. } | Error::InvalidParameters { key, .. } => key,
            Error::Api(api) => &api.message,
            Error::Serialization(_) => "serialization",
            Error::Deserialization(_) => "deserialization",
            Error::PollingCancelled { .. } => "polling_cancelled",
            Error::PollingExhausted { .. } => "polling_exhausted",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(api) if api.code == 404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_populates_fields() {
        let body = r#"{"code":422,"message":"invalid_parameters","details":["start_location"]}"#;
        let err = ApiError::from_response(422, body);
        assert_eq!(err.code, 422);
        assert_eq!(err.message, "invalid_parameters");
        assert_eq!(err.details, Some(serde_json::json!(["start_location"])));
        assert_eq!(err.server_response.as_deref(), Some(body));
    }

    #[test]
    fn missing_code_falls_back_to_status() {
        let err = ApiError::from_response(404, r#"{"message":"no_special_area"}"#);
        assert_eq!(err.code, 404);
        assert_eq!(err.message, "no_special_area");
    }

    #[test]
    fn non_json_body_becomes_other() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.code, 502);
        assert_eq!(err.message, OTHER);
        assert_eq!(err.server_response.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn transport_failure_has_no_status() {
        let err = ApiError::transport(&TransportError::Timeout);
        assert_eq!(err.code, 0);
        assert_eq!(err.message, OTHER);
    }

    #[test]
    fn key_is_exposed_for_every_family() {
        assert_eq!(Error::missing_token().key(), "missing_token");
        assert_eq!(Error::invalid("rider_missing", "no rider").key(), "rider_missing");
        let api: Error = ApiError::from_response(409, r#"{"message":"no_driver"}"#).into();
        assert_eq!(api.key(), "no_driver");
        assert_eq!(Error::PollingCancelled { attempts: 2 }.key(), "polling_cancelled");
    }

    #[test]
    fn not_found_only_matches_404_api_errors() {
        let not_found: Error = ApiError::from_response(404, "").into();
        assert!(not_found.is_not_found());
        assert!(!Error::missing_token().is_not_found());
    }
}
