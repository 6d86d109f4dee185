//! reqwest-based transport

use async_trait::async_trait;

use crate::error::HttpError;
use crate::response::Result;
use crate::transport::Transport;

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::trace!(%method, %url, "Executing request");

        reqwest::Client::execute(self, request)
            .await
            .map_err(HttpError::from)
    }
}
