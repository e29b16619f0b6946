//! Pluggable transport-level credentials.

use std::fmt;

use async_trait::async_trait;

use crate::Result;
use crate::types::HostUrl;

/// Supplies an `Authorization` header value per host.
///
/// Stands in for Kerberos/SPNEGO negotiation, which happens outside this
/// crate. Consulted only for requests that carry no session credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn authorization(&self, host: &HostUrl) -> Result<Option<String>>;
}

/// A fixed `Authorization` value, e.g. a pre-negotiated `Negotiate` token.
#[derive(Clone)]
pub struct StaticAuthorization(String);

impl StaticAuthorization {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Debug for StaticAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticAuthorization")
            .field(&"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticAuthorization {
    async fn authorization(&self, _host: &HostUrl) -> Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}
