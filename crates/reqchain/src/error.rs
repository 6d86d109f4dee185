//! HTTP error types

use thiserror::Error;

/// Errors surfaced while building, sending or decoding a request
///
/// Every variant carries plain strings so the error can be cloned and handed
/// out repeatedly by [`Response`](crate::Response) accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// HTTP error with status code
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Request cancelled through its cancellation token
    #[error("Request cancelled")]
    Cancelled,
    /// Body serialization error captured while configuring the request
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Response body could not be read or decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// Invalid header name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// Invalid method or target URL
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Filesystem error while reading an attachment
    #[error("I/O error: {0}")]
    Io(String),
    /// Proxy error
    #[error("Proxy error: {0}")]
    Proxy(String),
    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_body() || err.is_decode() {
            HttpError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            HttpError::Io(err.to_string())
        } else {
            HttpError::Decode(err.to_string())
        }
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::Io(err.to_string())
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::InvalidRequest(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderName> for HttpError {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        HttpError::InvalidHeader(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for HttpError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        HttpError::InvalidHeader(err.to_string())
    }
}
