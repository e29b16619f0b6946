//! YARN ResourceManager client.

use cdpm_core::{HostList, Request, Result, Transport};
use serde_json::Value;
use tracing::instrument;

use crate::client::ResilientClient;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

/// Client for the ResourceManager REST API across HA instances.
///
/// Standby ResourceManagers answer with an error or a redirect page, so
/// every call fails over to the next instance.
#[derive(Debug)]
pub struct YarnClient<T = ReqwestTransport> {
    client: ResilientClient<T>,
}

impl<T: Transport> YarnClient<T> {
    pub fn new(client: ResilientClient<T>) -> Self {
        Self { client }
    }

    /// Connect without session credentials; authorization, if any, comes
    /// from the transport's credential provider.
    pub fn connect(transport: T, rm_hosts: HostList) -> Self {
        Self::new(ResilientClient::new(
            transport,
            rm_hosts,
            SessionAuthenticator::anonymous(),
        ))
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    /// The `app` object of `/ws/v1/cluster/apps/{id}`.
    #[instrument(skip(self))]
    pub async fn application(&self, app_id: &str) -> Result<Value> {
        let mut response: Value = self
            .client
            .execute_json(Request::get(format!("/ws/v1/cluster/apps/{}", app_id)))
            .await?;
        if let Some(app) = response.get_mut("app") {
            return Ok(app.take());
        }
        Ok(response)
    }
}
