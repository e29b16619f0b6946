//! The composed resilient client.

use std::sync::Arc;

use async_trait::async_trait;
use cdpm_core::{ApiClient, HostList, Page, PageRequest, Request, Response, Result, Transport};
use futures_util::stream::Stream;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::executor::RequestExecutor;
use crate::failover::HostFailoverSelector;
use crate::paginate::PaginatedFetcher;
use crate::retry::RetryPolicy;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

/// Session handling, host failover and retry over one transport.
///
/// With a single host, errors are returned as they happened. With several,
/// each request goes through [`HostFailoverSelector`] and a failure on every
/// host becomes [`ExhaustedHostsError`](cdpm_core::error::ExhaustedHostsError).
///
/// [`execute`](Self::execute) does not retry; [`execute_with_retry`]
/// wraps the whole failover pass in the [`RetryPolicy`].
///
/// [`execute_with_retry`]: Self::execute_with_retry
#[derive(Debug)]
pub struct ResilientClient<T = ReqwestTransport> {
    transport: Arc<T>,
    executor: RequestExecutor,
    failover: HostFailoverSelector,
    retry: RetryPolicy,
}

impl<T: Transport> ResilientClient<T> {
    pub fn new(transport: T, hosts: HostList, authenticator: SessionAuthenticator) -> Self {
        Self {
            transport: Arc::new(transport),
            executor: RequestExecutor::new(Arc::new(authenticator)),
            failover: HostFailoverSelector::new(hosts),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the default retry policy (3 attempts, 5 s apart).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn authenticator(&self) -> &SessionAuthenticator {
        self.executor.authenticator()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current host order, most recently successful first.
    pub async fn hosts(&self) -> HostList {
        self.failover.hosts().await
    }

    /// Execute one request, failing over between hosts.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let hosts = self.failover.hosts().await;
        if hosts.len() == 1 {
            return self
                .executor
                .execute(self.transport.as_ref(), hosts.primary(), &request)
                .await;
        }
        self.failover
            .execute(|host| {
                let request = &request;
                async move {
                    self.executor
                        .execute(self.transport.as_ref(), &host, request)
                        .await
                }
            })
            .await
    }

    /// [`execute`](Self::execute) wrapped in the retry policy.
    pub async fn execute_with_retry(&self, request: Request) -> Result<Response> {
        self.retry.run(|| self.execute(request.clone())).await
    }

    /// Execute and decode JSON.
    pub async fn execute_json<R: DeserializeOwned>(&self, request: Request) -> Result<R> {
        self.execute(request).await?.json()
    }

    /// Establish the session on the first host that accepts it.
    pub async fn authenticate(&self) -> Result<()> {
        let authenticator = self.executor.authenticator();
        let hosts = self.failover.hosts().await;
        if hosts.len() == 1 {
            return authenticator
                .authenticate(self.transport.as_ref(), hosts.primary())
                .await;
        }
        self.failover
            .execute(|host| async move {
                authenticator
                    .authenticate(self.transport.as_ref(), &host)
                    .await
            })
            .await
    }

    /// Stream pages of a list endpoint whose items sit under `items_key`.
    ///
    /// `build` turns each [`PageRequest`] into the request to send.
    pub fn pages<'a, I, F>(
        &'a self,
        fetcher: PaginatedFetcher,
        items_key: &'a str,
        build: F,
    ) -> impl Stream<Item = Result<Page<I>>> + 'a
    where
        I: DeserializeOwned + Send + 'a,
        F: FnMut(PageRequest) -> Request + 'a,
    {
        fetcher.list(self, items_key, build)
    }
}

#[async_trait]
impl<T: Transport> ApiClient for ResilientClient<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        ResilientClient::execute(self, request).await
    }

    async fn authenticate(&self) -> Result<()> {
        ResilientClient::authenticate(self).await
    }
}
