//! Error types for the generated client.
//!
//! # Design
//! `SchemaError` is raised while building the API and always names the
//! declaration path that was rejected. `ApiError` covers everything a
//! generated call can fail with. HTTP status codes are never inspected, so
//! there is no "not found" variant: an error body that is not JSON surfaces
//! as `Deserialization`.

use thiserror::Error;

/// A schema or client option rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema at `{path}`: {reason}")]
pub struct SchemaError {
    pub path: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by endpoint lookups and generated calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No entity with this name was declared at this level.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    /// No custom action with this name was declared on this handle.
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// The payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A GET payload that is not a JSON object cannot become a query string.
    #[error("query parameters must be a JSON object, got {0}")]
    InvalidPayload(String),

    /// The transport failed before producing a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body is not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
