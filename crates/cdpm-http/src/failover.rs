//! Ordered failover across equivalent hosts with affinity.

use std::future::Future;

use cdpm_core::error::{ExhaustedHostsError, HostFailure};
use cdpm_core::{Error, HostList, HostUrl, Result};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Runs an operation against each host in turn until one succeeds.
///
/// HTTP errors and transport errors move on to the next host. Any other
/// error (authentication, decoding) ends the operation immediately, since
/// another instance of the same service would fail the same way.
///
/// The first host that succeeds is moved to the front of the list, so the
/// next operation starts there.
#[derive(Debug)]
pub struct HostFailoverSelector {
    hosts: RwLock<HostList>,
}

impl HostFailoverSelector {
    pub fn new(hosts: HostList) -> Self {
        Self {
            hosts: RwLock::new(hosts),
        }
    }

    /// Current host order.
    pub async fn hosts(&self) -> HostList {
        self.hosts.read().await.clone()
    }

    /// Run `operation` against the hosts in order.
    ///
    /// # Errors
    ///
    /// Returns [`ExhaustedHostsError`] carrying the last host's failure when
    /// every host failed, or the first non-host error encountered.
    pub async fn execute<F, Fut, R>(&self, mut operation: F) -> Result<R>
    where
        F: FnMut(HostUrl) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let snapshot = self.hosts().await;
        let mut last = None;

        for host in &snapshot {
            debug!(%host, "trying host");
            let failure = match operation(host.clone()).await {
                Ok(value) => {
                    if self.hosts.write().await.promote(host) {
                        info!(%host, "promoted host to front of list");
                    }
                    return Ok(value);
                }
                Err(Error::Http(err)) => HostFailure::Http(err),
                Err(Error::Transport(err)) => HostFailure::Transport(err),
                Err(other) => return Err(other),
            };
            warn!(%host, error = %failure, "host failed, trying next");
            last = Some(failure);
        }

        Err(ExhaustedHostsError {
            tried: snapshot.len(),
            last,
        }
        .into())
    }
}
