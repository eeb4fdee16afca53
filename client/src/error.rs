use reqwest::StatusCode;

/// Everything a call to the API can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("server unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{message} ({status})")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether trying again later could succeed without user action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Status { status, .. } => status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized(_) | Self::Forbidden(_) | Self::Decode(_) => false,
        }
    }

    /// HTTP status the server answered with, if it answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e)
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
