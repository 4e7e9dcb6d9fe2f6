use thiserror::Error;

/// Errors that can occur while calling the REST server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-2xx status. `code` and `message`
    /// mirror the `{code, message}` error body the service sends.
    #[error("API returned error: {status} {code} - {message}")]
    Response {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    /// Status code of a service-level error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error code of a service-level error, if this is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Response { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}
