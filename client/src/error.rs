//! Failure taxonomy raised by the request executor.

/// Classified failure of one network call.
///
/// The executor classifies and raises; the typed models propagate without
/// catching. The UI layer owns presentation and reacts to
/// [`ApiError::Authentication`] by forcing re-authentication.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connection, body read).
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 5xx, message from the body's `detail` field when present.
    #[error("server error: {0}")]
    Server(String),

    /// HTTP 403.
    #[error("authentication required")]
    Authentication,

    /// A save/delete response outside its success set that is not 5xx/403.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The configured base URL rejected an endpoint join.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}
