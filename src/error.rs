use thiserror::Error;

/// Failures surfaced by the upstream client and the board service.
///
/// The `Display` text doubles as the `message` of the failure payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("failed to get tenant_access_token: {0}")]
    Auth(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

pub type BoardResult<T> = Result<T, BoardError>;

/// Raw failure from an [`HttpTransport`](crate::api::transport::HttpTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::InvalidJson(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
