//! Client trait shared by the per-service clients.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::page::{Page, decode_page};
use crate::request::{Request, Response};

/// A resilient API client.
///
/// Services implement only endpoint shaping and response decoding on top
/// of this; authentication, failover and retry live behind `execute`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Execute one logical request, returning a successful response.
    async fn execute(&self, request: Request) -> Result<Response>;

    /// Establish (or re-establish) the session.
    async fn authenticate(&self) -> Result<()>;

    /// Execute and decode a JSON response.
    async fn execute_json<R>(&self, request: Request) -> Result<R>
    where
        R: DeserializeOwned + Send,
    {
        self.execute(request).await?.json()
    }

    /// Fetch one page of a list endpoint whose items sit under `items_key`.
    async fn page<I>(&self, request: Request, items_key: &str) -> Result<Page<I>>
    where
        I: DeserializeOwned + Send,
    {
        let value: Value = self.execute_json(request).await?;
        decode_page(value, items_key)
    }
}
