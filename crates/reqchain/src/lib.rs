//! Fluent HTTP requests over reqwest
//!
//! A [`RequestBuilder`] accumulates the shape of one call (method, headers,
//! parameters, body, file upload, cookies, proxy, timeout) and decides what
//! goes on the wire: parameters become a query string for `GET`/`HEAD` and
//! for raw bodies, a multipart body next to an attached file, or a
//! URL-encoded form body otherwise. [`RequestBuilder::exec`] always yields a
//! [`Response`] that decodes its body on demand.
//!
//! # Example
//!
//! ```no_run
//! use reqchain::Response;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct ApiResponse {
//!     code: String,
//!     msg: String,
//! }
//!
//! async fn example() -> reqchain::Result<ApiResponse> {
//!     let mut response: Response = reqchain::request("post", "https://api.example.com/items")
//!         .param("name", "widget")
//!         .exec()
//!         .await;
//!     response.json().await
//! }
//! ```

mod backends;
mod client;
mod dump;
mod error;
mod multipart;
mod params;
mod request;
mod response;
mod settings;
mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use cookie::Cookie;
pub use error::HttpError;
pub use params::Params;
pub use request::{request, FileAttachment, RequestBuilder, SentRequest};
pub use reqwest::{header, Method, StatusCode};
pub use response::{Response, Result};
pub use settings::ClientConfig;
pub use tokio_util::sync::CancellationToken;
pub use transport::Transport;

/// `GET` method name
pub const GET: &str = "GET";
/// `HEAD` method name
pub const HEAD: &str = "HEAD";
/// `POST` method name
pub const POST: &str = "POST";
/// `PUT` method name
pub const PUT: &str = "PUT";
/// `PATCH` method name
pub const PATCH: &str = "PATCH";
/// `DELETE` method name
pub const DELETE: &str = "DELETE";
/// `OPTIONS` method name
pub const OPTIONS: &str = "OPTIONS";

/// JSON content type
pub const TYPE_JSON: &str = "application/json;charset=utf-8";
/// XML content type
pub const TYPE_XML: &str = "application/xml;charset=utf-8";
/// URL-encoded form content type, the default for new builders
pub const TYPE_URLENCODED: &str = "application/x-www-form-urlencoded;charset=utf-8";
/// Alias of [`TYPE_URLENCODED`]
pub const TYPE_FORM: &str = TYPE_URLENCODED;
/// Alias of [`TYPE_URLENCODED`]
pub const TYPE_FORM_DATA: &str = TYPE_URLENCODED;
/// HTML content type
pub const TYPE_HTML: &str = "text/html;charset=utf-8";
/// Plain text content type
pub const TYPE_TEXT: &str = "text/plain;charset=utf-8";
/// Multipart content type without a boundary; file uploads set their own
pub const TYPE_MULTIPART: &str = "multipart/form-data;charset=utf-8";
/// Binary stream content type
pub const TYPE_STREAM: &str = "application/octet-stream;charset=utf-8";
