use std::time::Duration;

/// Errors raised while talking to the remote agent service.
#[derive(Debug, thiserror::Error)]
pub enum AgentApiError {
    /// The configured project endpoint could not be turned into a URL.
    #[error("invalid project endpoint `{endpoint}`: {reason}")]
    Endpoint { endpoint: String, reason: String },
    /// The API key cannot be sent as an HTTP header value.
    #[error("API key contains characters that are not valid in a header")]
    Credential,
    /// Transport level failure (DNS, TLS, connection reset, ...).
    #[error("request to agent service failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status code.
    #[error("agent service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response body did not match the expected shape.
    #[error("could not decode agent service response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The agent id is not one of the configured agents.
    #[error("agent `{0}` is not configured")]
    UnknownAgent(String),
    /// The local deadline elapsed before the run settled.
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    /// The user cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}
