//! Error type definitions.
//!
//! This module defines the error types surfaced by the client: typed HTTP
//! errors decoded from API error bodies, transport failures, and decode
//! failures. Rate limiting (429 with automatic handling enabled) is not an
//! error at this level; the request queue absorbs it and retries.

use serde::Deserialize;
use thiserror::Error;

/// Top-level error type for all client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The API returned a non-success status code.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The underlying HTTP request failed before a response was received
    /// (connection failure, DNS, timeout, invalid request).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response body could not be decoded into the expected shape.
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request URL could not be constructed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// An OAuth token exchange or renewal failed.
    #[error("oauth error: {0}")]
    OAuth(String),

    /// The response had an unexpected shape that typed decoding cannot
    /// represent (for example a numeric total delivered as garbage text).
    #[error("unexpected response from API: {0}")]
    UnexpectedResponse(String),

    /// The queue was dropped before the request settled. Only reachable if
    /// the owning client is torn down while requests are still pending.
    #[error("request queue closed before the request settled")]
    QueueClosed,
}

/// A typed HTTP error decoded from an API response.
///
/// Each variant carries the decoded [`ErrorResponse`] body, which may be
/// empty if the API returned no parseable error payload.
#[derive(Error, Debug)]
pub enum HttpError {
    /// 400 Bad Request.
    #[error("bad request: {0}")]
    BadRequest(ErrorResponse),

    /// 401 Unauthorized.
    #[error("unauthorized: {0}")]
    Unauthorized(ErrorResponse),

    /// 403 Forbidden.
    #[error("access denied: {0}")]
    AccessDenied(ErrorResponse),

    /// 404 Not Found.
    #[error("not found: {0}")]
    NotFound(ErrorResponse),

    /// 429 Too Many Requests. Surfaced only when automatic rate-limit
    /// handling is disabled on the client.
    #[error("too many requests: {0}")]
    TooManyRequests(ErrorResponse),

    /// Any 5xx server error.
    #[error("server error ({status}): {response}")]
    Server {
        /// The HTTP status code (500-599).
        status: u16,
        /// The decoded error body.
        response: ErrorResponse,
    },

    /// Any other non-success status code.
    #[error("unexpected status code ({status}): {response}")]
    Unexpected {
        /// The HTTP status code.
        status: u16,
        /// The decoded error body.
        response: ErrorResponse,
    },
}

impl HttpError {
    /// The HTTP status code behind this error.
    pub fn status(&self) -> u16 {
        match self {
            HttpError::BadRequest(_) => 400,
            HttpError::Unauthorized(_) => 401,
            HttpError::AccessDenied(_) => 403,
            HttpError::NotFound(_) => 404,
            HttpError::TooManyRequests(_) => 429,
            HttpError::Server { status, .. } | HttpError::Unexpected { status, .. } => *status,
        }
    }

    /// The decoded error body returned by the API.
    pub fn response(&self) -> &ErrorResponse {
        match self {
            HttpError::BadRequest(r)
            | HttpError::Unauthorized(r)
            | HttpError::AccessDenied(r)
            | HttpError::NotFound(r)
            | HttpError::TooManyRequests(r) => r,
            HttpError::Server { response, .. } | HttpError::Unexpected { response, .. } => response,
        }
    }
}

/// The error payload the API attaches to failed requests.
///
/// The API is inconsistent about which fields it fills in; all of them are
/// optional. `error` can be a string or a number depending on the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorResponse {
    /// The error identifier or message.
    #[serde(default)]
    pub error: Option<serde_json::Value>,

    /// A human-readable description of the error.
    #[serde(default)]
    pub description: Option<String>,

    /// A machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Decodes an error body, falling back to an empty payload when the body
    /// is not JSON or not an object.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(description) = &self.description {
            return write!(f, "{description}");
        }

        match &self.error {
            Some(serde_json::Value::String(s)) => write!(f, "{s}"),
            Some(other) => write!(f, "{other}"),
            None => write!(f, "no error details"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_from_json_body() {
        let response = ErrorResponse::from_body(
            r#"{"error": "Unauthorized", "description": "Missing token", "code": "no_token"}"#,
        );
        assert_eq!(response.description.as_deref(), Some("Missing token"));
        assert_eq!(response.code.as_deref(), Some("no_token"));
        assert_eq!(response.to_string(), "Missing token");
    }

    #[test]
    fn test_error_response_numeric_error_field() {
        let response = ErrorResponse::from_body(r#"{"error": 404}"#);
        assert_eq!(response.error, Some(serde_json::json!(404)));
        assert_eq!(response.to_string(), "404");
    }

    #[test]
    fn test_error_response_from_non_json_body() {
        let response = ErrorResponse::from_body("<html>Bad Gateway</html>");
        assert_eq!(response, ErrorResponse::default());
        assert_eq!(response.to_string(), "no error details");
    }

    #[test]
    fn test_http_error_status_codes() {
        assert_eq!(HttpError::BadRequest(ErrorResponse::default()).status(), 400);
        assert_eq!(HttpError::NotFound(ErrorResponse::default()).status(), 404);
        assert_eq!(
            HttpError::Server {
                status: 503,
                response: ErrorResponse::default()
            }
            .status(),
            503
        );
    }
}
