//! `reqwest`-backed transport.

use std::error::Error as _;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdpm_core::error::TransportError;
use cdpm_core::{
    Body, CredentialProvider, Error, HostUrl, Method, Request, RequestAuth, Response, Result,
    Transport,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use tracing::{debug, instrument, trace};

/// Options for building a [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Whole-request timeout. `None` waits as long as the server takes.
    pub timeout: Option<Duration>,
    /// Verify server certificates.
    pub verify_tls: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            verify_tls: true,
        }
    }
}

/// HTTP transport over a pooled `reqwest` client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    provider: Option<Arc<dyn CredentialProvider>>,
}

impl ReqwestTransport {
    /// Build a transport with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(&TransportOptions::default())
    }

    /// Build a transport with explicit options.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn with_options(options: &TransportOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("cdpm/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!options.verify_tls);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;

        Ok(Self {
            client,
            provider: None,
        })
    }

    /// Attach a provider for requests that carry no session credentials.
    pub fn with_credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(
        skip(self, request, auth),
        fields(host = %host, method = %request.method, path = %request.path)
    )]
    async fn send(
        &self,
        host: &HostUrl,
        request: &Request,
        auth: &RequestAuth,
    ) -> Result<Response> {
        let url = host.join(&request.path);
        debug!(%url, "sending request");
        trace!(query = ?request.query, ?auth, "request details");

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };
        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Form(encoded) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded.clone()),
        };
        builder = match auth {
            RequestAuth::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            RequestAuth::Header(token) => builder.header(AUTHORIZATION, token.header_value()),
            RequestAuth::Cookies(_) => match auth.cookie_header() {
                Some(cookies) => builder.header(COOKIE, cookies),
                None => builder,
            },
            RequestAuth::None => match &self.provider {
                Some(provider) => match provider.authorization(host).await? {
                    Some(value) => builder.header(AUTHORIZATION, value),
                    None => builder,
                },
                None => builder,
            },
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(status, bytes = body.len(), "response received");

        Ok(Response::new(status, headers, body.to_vec()))
    }
}

/// Classify a `reqwest` failure.
fn transport_error(err: reqwest::Error) -> Error {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    let err = if err.is_builder() || err.is_redirect() {
        TransportError::Request { message }
    } else if err.is_timeout() {
        TransportError::Timeout { message }
    } else if err.is_connect() {
        TransportError::Connection { message }
    } else if err.is_body() || err.is_decode() {
        TransportError::Body { message }
    } else {
        TransportError::Connection { message }
    };
    Error::Transport(err)
}
