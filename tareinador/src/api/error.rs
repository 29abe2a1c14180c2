//! Error types for backend calls

use thiserror::Error;

/// Errors that can occur while talking to the document backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error(
        "Server error ({status}){}",
        .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default()
    )]
    Server {
        status: u16,
        /// Value of the `error` field of the response body, if any
        message: Option<String>,
    },

    /// Base URL could not be parsed or cannot carry a path
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// IO error (reading an image to upload)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Message supplied by the backend, if it sent one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the request never got an answer because it timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_timeout())
    }
}

/// Result type for backend calls
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let with_message = ApiError::Server {
            status: 404,
            message: Some("Documento no encontrado".to_string()),
        };
        assert_eq!(
            with_message.to_string(),
            "Server error (404): Documento no encontrado"
        );
        assert_eq!(with_message.backend_message(), Some("Documento no encontrado"));

        let bare = ApiError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(bare.to_string(), "Server error (500)");
        assert_eq!(bare.backend_message(), None);
    }
}
