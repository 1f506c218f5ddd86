//! Failures talking to the OPD backend.

/// API gateway errors. Every variant is recoverable: the caller turns it
/// into a notice and aborts the current operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("OPD service is not reachable at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("OPD service returned error (status {status}): {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },
    #[error("Unexpected response from OPD service: {0}")]
    Decode(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Message the backend attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(m), ..
            } => Some(m),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}
