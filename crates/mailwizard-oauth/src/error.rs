//! Error types for the `OAuth2` sub-flow.

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Error returned by the authorization server.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// The incoming server hostname does not belong to a known `OAuth2` provider.
    #[error("No OAuth2 provider known for host {0}")]
    UnsupportedHost(String),

    /// No client ID is configured for the provider.
    #[error("No client ID configured for {0}")]
    MissingClientId(String),

    /// An operation needed an authorization request that was never started.
    #[error("Authorization has not been started")]
    NotStarted,

    /// The redirect's `state` does not belong to the pending request.
    #[error("Authorization state mismatch")]
    StateMismatch,

    /// The redirect lacks a required query parameter.
    #[error("Redirect is missing the {0} parameter")]
    MissingParameter(&'static str),
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }
}
