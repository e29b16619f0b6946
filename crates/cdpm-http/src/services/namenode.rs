//! NameNode JMX health client.

use cdpm_core::error::InvalidInputError;
use cdpm_core::{HostList, Request, Result, Transport};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::client::ResilientClient;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

const NAMENODE_INFO: &str = "Hadoop:service=NameNode,name=NameNodeInfo";

#[derive(Deserialize)]
struct Jmx {
    #[serde(default)]
    beans: Vec<Value>,
}

/// Reads NameNode health from JMX, failing over between HA NameNodes.
#[derive(Debug)]
pub struct NameNodeClient<T = ReqwestTransport> {
    client: ResilientClient<T>,
}

impl<T: Transport> NameNodeClient<T> {
    pub fn new(client: ResilientClient<T>) -> Self {
        Self { client }
    }

    pub fn connect(transport: T, namenode_hosts: HostList) -> Self {
        Self::new(ResilientClient::new(
            transport,
            namenode_hosts,
            SessionAuthenticator::anonymous(),
        ))
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    /// The `NameNodeInfo` bean (capacity, live and dead nodes, ...).
    #[instrument(skip(self))]
    pub async fn health_status(&self) -> Result<Value> {
        let request = Request::get("/jmx").query("qry", NAMENODE_INFO);
        let jmx: Jmx = self.client.execute_json(request).await?;
        jmx.beans.into_iter().next().ok_or_else(|| {
            InvalidInputError::Other {
                message: format!("no {} bean in JMX response", NAMENODE_INFO),
            }
            .into()
        })
    }
}
