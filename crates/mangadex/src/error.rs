//! Error types for the MangaDex client.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to MangaDex
///
/// None of these are retried; callers are expected to abort the run.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),

    #[error("invalid credentials: environment variable {0} is not valid Unicode")]
    InvalidCredentials(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {endpoint} is missing {what}")]
    MissingField { endpoint: String, what: String },

    #[error("token file {}: {source}", path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Decode a JSON value into a typed response, tagging failures with the endpoint
    pub(crate) fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        value: serde_json::Value,
    ) -> Result<T, ApiError> {
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
