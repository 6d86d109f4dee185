//! HTTP request builder

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use cookie::Cookie;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{parse_proxy, HttpClientBuilder};
use crate::error::HttpError;
use crate::multipart::MultipartBody;
use crate::params::Params;
use crate::response::{Response, Result};
use crate::settings::ClientConfig;
use crate::transport::Transport;
use crate::{TYPE_JSON, TYPE_URLENCODED, TYPE_XML};

/// File attached as the single file part of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// Form field name
    pub name: String,
    /// File name announced to the server
    pub filename: String,
    /// Local path the contents are read from
    pub path: PathBuf,
}

/// Snapshot of the request that was handed to the transport
#[derive(Debug, Clone)]
pub struct SentRequest {
    /// Request method
    pub method: Method,
    /// Final URL, including any appended query string
    pub url: url::Url,
    /// Headers as sent
    pub headers: HeaderMap,
    /// Body bytes, if the request carried a body
    pub body: Option<Bytes>,
}

/// Fluent builder accumulating everything needed for one HTTP call
///
/// Configuration failures (unserializable JSON/XML bodies, invalid header
/// names) are stored and surfaced when the request is sent, so setters can be
/// chained without intermediate error handling. The builder is consumed by
/// [`send`](Self::send) or [`exec`](Self::exec).
#[derive(Debug)]
pub struct RequestBuilder {
    target: String,
    method: String,
    headers: HeaderMap,
    params: Params,
    body: Option<Bytes>,
    file: Option<FileAttachment>,
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
    timeout: Option<Duration>,
    cookies: Vec<Cookie<'static>>,
    cancellation: Option<CancellationToken>,
    error: Option<HttpError>,
}

impl RequestBuilder {
    /// Create a builder; the method is uppercased
    ///
    /// New builders carry `Content-Type: application/x-www-form-urlencoded`.
    pub fn new(method: impl AsRef<str>, target: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TYPE_URLENCODED));
        Self {
            target: target.into(),
            method: method.as_ref().to_uppercase(),
            headers,
            params: Params::new(),
            body: None,
            file: None,
            transport: None,
            config: ClientConfig::default(),
            timeout: None,
            cookies: Vec::new(),
            cancellation: None,
            error: None,
        }
    }

    // === Accessors ===

    /// Uppercased method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Target URL as given
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Accumulated headers
    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Accumulated parameters
    pub fn param_map(&self) -> &Params {
        &self.params
    }

    /// Settings for the default client
    pub fn client_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Deferred configuration error, if any
    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_ref()
    }

    // === Headers ===

    /// Set the `Content-Type` header
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Set a header, replacing existing values
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(key.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Append a header value, keeping existing values
    pub fn add_header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(key.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.headers.append(name, value);
            }
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Replace the whole header set
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    // === Parameters ===

    /// Append a query/form parameter
    pub fn add_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.add(key, value);
        self
    }

    /// Set a query/form parameter, replacing existing values
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Replace the whole parameter set
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    // === Body ===

    /// Raw request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// JSON-encode `value` as the body
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(data) => self.body = Some(data.into()),
            Err(err) => self.error = Some(HttpError::Serialization(err.to_string())),
        }
        self.content_type(TYPE_JSON)
    }

    /// XML-encode `value` as the body
    pub fn xml<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match quick_xml::se::to_string(value) {
            Ok(data) => self.body = Some(data.into()),
            Err(err) => self.error = Some(HttpError::Serialization(err.to_string())),
        }
        self.content_type(TYPE_XML)
    }

    /// Attach a file uploaded as multipart form data
    ///
    /// Ignored if a raw body is also set.
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.file = Some(FileAttachment {
            name: name.into(),
            filename: filename.into(),
            path: path.into(),
        });
        self
    }

    // === Client and transport ===

    /// Send through `transport` instead of a default client
    ///
    /// Proxy and TLS settings only shape the default client and are ignored
    /// once a transport is injected.
    pub fn client<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Settings for the default client
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Per-request timeout, applied with any transport
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Route the request through a proxy
    ///
    /// Only applies to the default client. A malformed URL still fails the
    /// request when a transport is injected.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Skip TLS certificate verification; only applies to the default client
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Abort the call when `token` is cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    // === Cookies ===

    /// Attach a cookie
    pub fn add_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Replace every attached cookie
    pub fn cookies(mut self, cookies: Vec<Cookie<'static>>) -> Self {
        self.cookies = cookies;
        self
    }

    // === Execution ===

    /// Send the request and return the live response
    pub async fn send(self) -> Result<reqwest::Response> {
        let (_, result) = self.dispatch().await;
        result
    }

    /// Send the request, timing it, and wrap the outcome
    ///
    /// Never fails: errors are carried by the returned [`Response`].
    pub async fn exec(self) -> Response {
        let cancellation = self.cancellation.clone();
        let started = Instant::now();
        let (sent, result) = self.dispatch().await;
        let took = started.elapsed();

        match result {
            Ok(response) => Response::new(sent, response, took, cancellation),
            Err(err) => Response::from_error(sent, err, took, cancellation),
        }
    }

    async fn dispatch(self) -> (Option<SentRequest>, Result<reqwest::Response>) {
        let cancellation = self.cancellation.clone();
        let (transport, request) = match self.assemble().await {
            Ok(assembled) => assembled,
            Err(err) => return (None, Err(err)),
        };

        let sent = SentRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request
                .body()
                .and_then(|body| body.as_bytes())
                .map(Bytes::copy_from_slice),
        };
        tracing::debug!(method = %sent.method, url = %sent.url, "Sending request");

        let pending = transport.execute(request);
        let result = match cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(HttpError::Cancelled),
                    result = pending => result,
                }
            }
            None => pending.await,
        };

        if let Err(err) = &result {
            tracing::debug!(url = %sent.url, "Request failed: {err}");
        }
        (Some(sent), result)
    }

    /// Resolve body, query, proxy, headers and cookies into a request
    async fn assemble(mut self) -> Result<(Arc<dyn Transport>, reqwest::Request)> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let mut query = None;
        let mut body = None;
        if self.method == crate::GET || self.method == crate::HEAD {
            if !self.params.is_empty() {
                query = Some(self.params.encode()?);
            }
        } else if let Some(raw) = self.body.take() {
            body = Some(raw);
            if !self.params.is_empty() {
                query = Some(self.params.encode()?);
            }
        } else if let Some(file) = self.file.take() {
            let contents = tokio::fs::read(&file.path).await?;
            let mut multipart = MultipartBody::new();
            multipart.file(&file.name, &file.filename, &contents);
            for (key, value) in self.params.sorted() {
                multipart.text(key, value);
            }
            self.headers.insert(CONTENT_TYPE, HeaderValue::from_str(&multipart.content_type())?);
            body = Some(multipart.finish());
        } else {
            body = Some(Bytes::from(self.params.encode()?));
        }

        let proxy = self.config.proxy.as_deref().map(parse_proxy).transpose()?;
        let transport = match self.transport.take() {
            Some(transport) => {
                if proxy.is_some() || self.config.accept_invalid_certs {
                    tracing::warn!("Proxy/TLS settings ignored for an injected transport");
                }
                transport
            }
            None => {
                let client = HttpClientBuilder::default()
                    .config(self.config.clone())
                    .build()?;
                Arc::new(client) as Arc<dyn Transport>
            }
        };

        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|e| HttpError::InvalidRequest(format!("{}: {e}", self.method)))?;
        let mut url = url::Url::parse(&self.target)?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            append_query(&mut url, &query);
        }

        let mut request = reqwest::Request::new(method, url);
        if let Some(body) = body {
            *request.body_mut() = Some(body.into());
        }
        *request.timeout_mut() = self.timeout;

        let mut headers = self.headers;
        attach_cookies(&mut headers, &self.cookies)?;
        *request.headers_mut() = headers;

        Ok((transport, request))
    }
}

/// Append an encoded query after any query already on the URL
fn append_query(url: &mut url::Url, query: &str) {
    let merged = match url.query() {
        Some(existing) if !existing.is_empty() => {
            format!("{}&{query}", existing.trim_end_matches('&'))
        }
        _ => query.to_string(),
    };
    url.set_query(Some(&merged));
}

fn attach_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'static>]) -> Result<()> {
    if cookies.is_empty() {
        return Ok(());
    }

    let pairs = cookies
        .iter()
        .map(|c| c.stripped().to_string())
        .collect::<Vec<_>>()
        .join("; ");
    let value = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.is_empty() => format!("{existing}; {pairs}"),
        _ => pairs,
    };
    headers.insert(COOKIE, HeaderValue::from_str(&value)?);
    Ok(())
}

fn parse_header(key: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    Ok((
        HeaderName::from_bytes(key.as_bytes())?,
        HeaderValue::from_str(value)?,
    ))
}

/// Start a request with the given method and target
pub fn request(method: impl AsRef<str>, target: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new(method, target)
}
