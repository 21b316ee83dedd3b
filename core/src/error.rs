//! Error types for the TeamCity REST client.
//!
//! # Design
//! "Absent" is deliberately not an error: reads return `Ok(None)` and the
//! transport reports 404 as `Outcome::NotFound`. What remains are hard
//! failures. Each variant that comes from a network call carries the request
//! label (`METHOD url`) so a surfaced error names the attempted operation, the
//! status or transport cause, and the response body when one exists.

use crate::retry::RetryAbort;
use crate::transport::TransportError;

/// Errors returned by `TeamCityClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response: connection, DNS, timeout or
    /// body-read failure.
    #[error("{request} failed: {source}")]
    Transport {
        request: String,
        #[source]
        source: TransportError,
    },

    /// The server answered with a status other than 200, 204 or 404.
    #[error("{request} failed with status: {status}, body: {body}")]
    Status {
        request: String,
        status: u16,
        body: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("{request} could not serialize its body: {source}")]
    Serialization {
        request: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("{request} returned a malformed body: {source}. Body: {body:?}")]
    Deserialization {
        request: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// A corrective write issued after the server coerced a field failed.
    #[error("could not correct {property} property, potentially not enough time for versioned settings to be applied: {source}")]
    CorrectionFailed {
        property: &'static str,
        #[source]
        source: Box<ApiError>,
    },

    /// A corrective write succeeded but echoed a value of the wrong type.
    #[error("malformed {property} property returned by corrective write: {value:?}")]
    MalformedCorrection { property: &'static str, value: String },

    /// A retry policy refused to keep retrying.
    #[error("{request}: {source}")]
    RetryAborted {
        request: String,
        #[source]
        source: RetryAbort,
    },

    /// The connection could not be built or the server rejected the
    /// credentials.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Status code carried by a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::CorrectionFailed { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True for the two reconciliation failures.
    pub fn is_reconciliation(&self) -> bool {
        matches!(
            self,
            ApiError::CorrectionFailed { .. } | ApiError::MalformedCorrection { .. }
        )
    }
}
