//! HTTP response wrapper

use std::time::Duration;

use bytes::Bytes;
use cookie::Cookie;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{StatusCode, Version};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::dump;
use crate::error::HttpError;
use crate::request::SentRequest;

/// Result type used throughout the crate
pub type Result<R, E = HttpError> = std::result::Result<R, E>;

/// Outcome of [`RequestBuilder::exec`](crate::RequestBuilder::exec)
///
/// Holds either a live response or the error that prevented one. The body is
/// read from the connection on the first decode call and cached; later calls
/// reuse the cached bytes, so a failed JSON decode can be followed by
/// [`text`](Self::text) on the same body.
#[derive(Debug)]
pub struct Response {
    inner: Option<reqwest::Response>,
    status: Option<StatusCode>,
    version: Version,
    headers: HeaderMap,
    url: Option<url::Url>,
    body: Option<Bytes>,
    request: Option<SentRequest>,
    took: Duration,
    cancellation: Option<CancellationToken>,
    error: Option<HttpError>,
}

impl Response {
    pub(crate) fn new(
        request: Option<SentRequest>,
        response: reqwest::Response,
        took: Duration,
        cancellation: Option<CancellationToken>,
    ) -> Self {
        Self {
            status: Some(response.status()),
            version: response.version(),
            headers: response.headers().clone(),
            url: Some(response.url().clone()),
            inner: Some(response),
            body: None,
            request,
            took,
            cancellation,
            error: None,
        }
    }

    pub(crate) fn from_error(
        request: Option<SentRequest>,
        error: HttpError,
        took: Duration,
        cancellation: Option<CancellationToken>,
    ) -> Self {
        Self {
            inner: None,
            status: None,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            url: None,
            body: None,
            request,
            took,
            cancellation,
            error: Some(error),
        }
    }

    /// Builder-time or transport error, if any
    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_ref()
    }

    /// Time spent sending the request and receiving the response head
    pub fn took(&self) -> Duration {
        self.took
    }

    /// The request as it was handed to the transport
    pub fn request(&self) -> Option<&SentRequest> {
        self.request.as_ref()
    }

    /// Cancellation token the request was sent with
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Final URL after redirects
    pub fn url(&self) -> Option<&url::Url> {
        self.url.as_ref()
    }

    /// Response status, if a response was received
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Numeric status, or 503 when no response was received
    pub fn status_code(&self) -> u16 {
        self.status.unwrap_or(StatusCode::SERVICE_UNAVAILABLE).as_u16()
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| s.is_success())
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_client_error())
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    /// Response headers; empty when no response was received
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Cookies set by the server
    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .collect()
    }

    /// Raw body, read from the connection on first use
    pub async fn bytes(&mut self) -> Result<Bytes> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }

        let Some(response) = self.inner.take() else {
            return Err(HttpError::Other("Response body unavailable".to_string()));
        };
        // consuming the response releases the connection once drained
        match response.bytes().await {
            Ok(body) => {
                tracing::trace!(len = body.len(), "Read response body");
                self.body = Some(body.clone());
                Ok(body)
            }
            Err(err) => {
                let err = HttpError::from(err);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Body as text; invalid UTF-8 sequences are replaced
    pub async fn text(&mut self) -> Result<String> {
        let body = self.bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Decode the body as JSON
    ///
    /// Numbers decoded into `serde_json::Value` keep their exact textual form.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body).map_err(HttpError::from)
    }

    /// Decode the body as XML
    pub async fn xml<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.bytes().await?;
        let text = std::str::from_utf8(&body).map_err(|e| HttpError::Decode(e.to_string()))?;
        quick_xml::de::from_str(text).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Turn a non-2xx status into [`HttpError::Status`], using the body as message
    pub async fn error_for_status(&mut self) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.status {
            Some(status) if !status.is_success() => {
                let message = self.text().await.unwrap_or_default();
                Err(HttpError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Ok(()),
        }
    }

    /// HTTP/1.1 wire-format dump of the request that was sent
    pub fn dump_request(&self, include_body: bool) -> Result<String> {
        let request = self
            .request
            .as_ref()
            .ok_or_else(|| HttpError::Other("No request was sent".to_string()))?;
        Ok(dump::dump_request(request, include_body))
    }

    /// Wire-format dump of the response; reads and caches the body if asked to
    pub async fn dump_response(&mut self, include_body: bool) -> Result<String> {
        let status = self
            .status
            .ok_or_else(|| HttpError::Other("No response was received".to_string()))?;
        let body = if include_body {
            Some(self.bytes().await?)
        } else {
            None
        };
        Ok(dump::dump_response(
            self.version,
            status,
            &self.headers,
            body.as_deref(),
        ))
    }

    /// Take the live response, if the body has not been read yet
    pub fn into_inner(self) -> Option<reqwest::Response> {
        self.inner
    }
}
