//! Pluggable request dispatch

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::response::Result;

/// Sends a fully assembled request and returns the live response
///
/// [`HttpClient`](crate::HttpClient) and `reqwest::Client` implement this
/// trait. Tests can substitute an in-memory implementation to inspect what a
/// [`RequestBuilder`](crate::RequestBuilder) puts on the wire without opening
/// sockets.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Execute the request
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        (**self).execute(request).await
    }
}
