//! Single-host request execution with one renew-and-retry on `401`.

use std::sync::Arc;

use cdpm_core::error::{AuthError, HttpError};
use cdpm_core::{Error, HostUrl, Request, Response, Result, Transport};
use tracing::{debug, error, instrument, warn};

use crate::session::SessionAuthenticator;

/// Sends one logical request to one host.
///
/// A `401` invalidates the session, renews it and re-sends the identical
/// request once. A second `401` is an [`AuthError::Rejected`]. Any other
/// status >= 400 is returned as [`Error::Http`] without retrying.
///
/// When the authenticator has nothing to renew with (no probe path or no
/// credentials), a `401` is returned as [`Error::Http`] straight away so a
/// failover pass moves on to the next host.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    authenticator: Arc<SessionAuthenticator>,
}

impl RequestExecutor {
    pub fn new(authenticator: Arc<SessionAuthenticator>) -> Self {
        Self { authenticator }
    }

    pub fn authenticator(&self) -> &SessionAuthenticator {
        &self.authenticator
    }

    #[instrument(
        skip(self, transport, request),
        fields(host = %host, method = %request.method, path = %request.path)
    )]
    pub async fn execute<T>(
        &self,
        transport: &T,
        host: &HostUrl,
        request: &Request,
    ) -> Result<Response>
    where
        T: Transport + ?Sized,
    {
        self.authenticator.ensure(transport, host).await?;

        let auth = self.authenticator.request_auth().await;
        let err = match check(transport.send(host, request, &auth).await?) {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };
        if !err.is_unauthorized() || !self.authenticator.can_renew() {
            return Err(Error::Http(err));
        }

        warn!("authentication failed, renewing session");
        self.authenticator.invalidate().await;
        self.authenticator.renew(transport, host).await?;

        let auth = self.authenticator.request_auth().await;
        match check(transport.send(host, request, &auth).await?) {
            Ok(response) => Ok(response),
            Err(err) if err.is_unauthorized() => {
                error!("authentication failed after renewal");
                Err(AuthError::Rejected {
                    status: err.status,
                    body: err.body,
                }
                .into())
            }
            Err(err) => Err(Error::Http(err)),
        }
    }
}

fn check(response: Response) -> std::result::Result<Response, HttpError> {
    if response.is_success() {
        debug!(status = response.status, "request succeeded");
        return Ok(response);
    }
    error!(
        status = response.status,
        headers = ?response.headers,
        "request failed"
    );
    Err(response.into_http_error())
}
