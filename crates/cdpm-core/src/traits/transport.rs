//! Transport trait.

use async_trait::async_trait;

use crate::Result;
use crate::request::{Request, RequestAuth, Response};
use crate::types::HostUrl;

/// Sends one request to one host.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status; classifying statuses is the caller's job. Only
/// failures to obtain a response become errors, as
/// [`TransportError`](crate::error::TransportError).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, host: &HostUrl, request: &Request, auth: &RequestAuth)
    -> Result<Response>;
}
