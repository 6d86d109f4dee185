//! HTTP client wrapper

use std::time::Duration;

use async_trait::async_trait;

use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::Result;
use crate::settings::ClientConfig;
use crate::transport::Transport;

/// HTTP client wrapper
///
/// Cheap to clone; clones share the connection pool and cookie jar.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    ///
    /// Falls back to a bare `reqwest::Client` if the default configuration
    /// cannot be applied (for example when no TLS roots are available).
    pub fn new() -> Self {
        match HttpClientBuilder::default().build() {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!("Default client configuration rejected, using bare client: {err}");
                Self {
                    inner: reqwest::Client::new(),
                }
            }
        }
    }

    /// Create a new HTTP client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create an HttpClient from a reqwest::Client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    /// Access the underlying reqwest client
    pub fn as_reqwest(&self) -> &reqwest::Client {
        &self.inner
    }

    // === Request builder methods ===

    /// Request builder bound to this client
    ///
    /// [`RequestBuilder::proxy`] and
    /// [`RequestBuilder::danger_accept_invalid_certs`] have no effect on the
    /// returned builder; set them with [`HttpClient::builder`].
    pub fn request(&self, method: &str, url: &str) -> RequestBuilder {
        RequestBuilder::new(method, url).client(self.clone())
    }

    /// GET request builder bound to this client, see [`request`](Self::request)
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(crate::GET, url)
    }

    /// HEAD request builder bound to this client, see [`request`](Self::request)
    pub fn head(&self, url: &str) -> RequestBuilder {
        self.request(crate::HEAD, url)
    }

    /// POST request builder bound to this client, see [`request`](Self::request)
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(crate::POST, url)
    }

    /// PUT request builder bound to this client, see [`request`](Self::request)
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(crate::PUT, url)
    }

    /// PATCH request builder bound to this client, see [`request`](Self::request)
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(crate::PATCH, url)
    }

    /// DELETE request builder bound to this client, see [`request`](Self::request)
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(crate::DELETE, url)
    }

    /// OPTIONS request builder bound to this client, see [`request`](Self::request)
    pub fn options(&self, url: &str) -> RequestBuilder {
        self.request(crate::OPTIONS, url)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        Transport::execute(&self.inner, request).await
    }
}

/// HTTP client builder for configuring timeouts, pooling, proxy and TLS settings
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: ClientConfig,
    timeout: Option<Duration>,
}

impl HttpClientBuilder {
    /// Replace every setting at once
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Overall request timeout; takes precedence over `timeout_secs`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Accept invalid TLS certificates
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, url: url::Url) -> Self {
        self.config.proxy = Some(url.to_string());
        self
    }

    /// Enable or disable the cookie jar
    pub fn cookie_store(mut self, enable: bool) -> Self {
        self.config.cookie_store = enable;
        self
    }

    /// Build the HTTP client
    pub fn build(self) -> Result<HttpClient> {
        let config = self.config;
        let timeout = self.timeout.unwrap_or_else(|| config.timeout());
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(config.connect_timeout())
            .tcp_keepalive(config.tcp_keepalive())
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .cookie_store(config.cookie_store);

        if let Some(proxy) = config.proxy.as_deref() {
            let proxy_url = parse_proxy(proxy)?;
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| HttpError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(HttpError::from)?;
        Ok(HttpClient { inner: client })
    }
}

/// Parse a proxy URL, mapping failures to [`HttpError::Proxy`]
pub(crate) fn parse_proxy(proxy: &str) -> Result<url::Url> {
    url::Url::parse(proxy).map_err(|e| HttpError::Proxy(format!("Invalid proxy URL: {e}")))
}
