//! HTTP transport and response classification.
//!
//! One request in, one classified response out. The queue's jobs wrap
//! [`fetch`]: transport-level failures and non-success statuses are
//! reported back through the job's [`Attempt`](crate::queue::Attempt), and
//! the 429 / `Retry-After` interpretation happens in the client facade so
//! the queue can stay policy-free.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, StatusCode};

use crate::error::{Error, ErrorResponse, HttpError};

/// User agent applied when the client options do not override it.
pub const DEFAULT_USER_AGENT: &str = "envato-rs (https://github.com/envato/envato-rs)";

/// Everything needed for one API round-trip.
pub struct FetchOptions {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: String,
    /// Bearer token, applied as the `Authorization` header.
    pub token: String,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// URL-encoded form body, for POST/PUT/PATCH/DELETE requests.
    pub form: Option<Vec<(String, String)>>,
}

/// A raw API response: status, headers, and undecoded body.
pub struct FetchResponse {
    /// The response status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body.
    pub body: String,
}

impl FetchResponse {
    /// The `Retry-After` header parsed as whole seconds, if present and
    /// numeric. HTTP-date forms of the header are not used by this API and
    /// are treated as absent.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    }
}

/// Builds the shared `reqwest` client used for every request.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::ClientBuilder::new();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Performs one HTTP request and returns the raw response.
///
/// Only transport-level failures (connection, DNS, timeout) are errors
/// here; any status code, including 4xx/5xx, is a successful fetch. Use
/// [`status_error`] to classify the status.
pub async fn fetch(
    client: &reqwest::Client,
    options: FetchOptions,
) -> Result<FetchResponse, Error> {
    debug!("{} {}", options.method, options.url);

    let mut request = client
        .request(options.method, &options.url)
        .header(AUTHORIZATION, format!("Bearer {}", options.token))
        .header(USER_AGENT, options.user_agent);

    if let Some(form) = &options.form {
        request = request.form(form);
    }

    let response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;

    Ok(FetchResponse {
        status,
        headers,
        body,
    })
}

/// Maps a non-success status code to a typed [`HttpError`], decoding the
/// error body the API attaches. Returns `None` for success statuses.
pub fn status_error(status: StatusCode, body: &str) -> Option<HttpError> {
    if status.is_success() {
        return None;
    }

    let response = ErrorResponse::from_body(body);

    Some(match status.as_u16() {
        400 => HttpError::BadRequest(response),
        401 => HttpError::Unauthorized(response),
        403 => HttpError::AccessDenied(response),
        404 => HttpError::NotFound(response),
        429 => HttpError::TooManyRequests(response),
        status @ 500..=599 => HttpError::Server { status, response },
        status => HttpError::Unexpected { status, response },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_retry_after(value: Option<&str>) -> FetchResponse {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(RETRY_AFTER, value.parse().unwrap());
        }
        FetchResponse {
            status: StatusCode::TOO_MANY_REQUESTS,
            headers,
            body: String::new(),
        }
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(response_with_retry_after(Some("30")).retry_after_seconds(), Some(30));
        assert_eq!(response_with_retry_after(Some(" 5 ")).retry_after_seconds(), Some(5));
        assert_eq!(response_with_retry_after(Some("soon")).retry_after_seconds(), None);
        assert_eq!(response_with_retry_after(None).retry_after_seconds(), None);
    }

    #[test]
    fn test_status_classification() {
        assert!(status_error(StatusCode::OK, "{}").is_none());
        assert!(status_error(StatusCode::NO_CONTENT, "").is_none());

        let body = r#"{"error": "Not Found", "description": "No such item"}"#;
        match status_error(StatusCode::NOT_FOUND, body) {
            Some(HttpError::NotFound(response)) => {
                assert_eq!(response.description.as_deref(), Some("No such item"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }

        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, ""),
            Some(HttpError::Server { status: 502, .. })
        ));
        assert!(matches!(
            status_error(StatusCode::IM_A_TEAPOT, ""),
            Some(HttpError::Unexpected { status: 418, .. })
        ));
    }
}
