use thiserror::Error;

/// Errors returned by Cint client operations.
///
/// [`ClientError::Configuration`] and [`ClientError::MissingArgument`] are
/// produced before any network activity starts. Everything else comes back
/// from the awaited request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client configuration is incomplete or invalid (for example empty credentials).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A required call argument was empty or absent.
    #[error("argument `{0}` is required")]
    MissingArgument(&'static str),

    /// An authenticated path was requested before credentials were attached.
    #[error("authentication required for '{path}': call `set_credentials` first")]
    AuthenticationRequired { path: String },

    /// Endpoint path could not be joined to the base URL.
    #[error("invalid endpoint path '{0}'")]
    InvalidPath(String),

    /// HTTP transport-layer request failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Request body could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response body was expected to be JSON but did not parse.
    #[error("invalid JSON response: {body}")]
    InvalidResponse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// A link relation expected in a response was not present exactly once.
    #[error("response does not contain exactly one '{0}' link")]
    MissingLink(&'static str),

    /// A response could not be projected into the requested shape.
    #[error("unexpected response shape: {0}")]
    InvalidProjection(String),
}
