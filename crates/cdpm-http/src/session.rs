//! Session lifecycle: credential mode, cookie jar, renewal.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cdpm_core::error::AuthError;
use cdpm_core::{
    AuthConfig, Credentials, Error, HostUrl, Request, RequestAuth, Result, SESSION_COOKIE,
    SessionStore, SessionToken, Transport,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Owns the credential mode of one client and the session derived from it.
///
/// Exactly one [`Credentials`] mode is active for the lifetime of the
/// authenticator. When a probe path is configured, [`renew`] exchanges the
/// credentials for a `SESSION` cookie by calling that path, and subsequent
/// requests carry the cookie jar instead of the primary credentials.
/// Without a probe the credentials are attached to every request as-is.
///
/// A successful renewal hands the session token to the [`SessionStore`], if
/// one is attached. A renewal that ends in `401` never does.
///
/// [`renew`]: SessionAuthenticator::renew
pub struct SessionAuthenticator {
    credentials: Option<Credentials>,
    probe: Option<String>,
    store: Option<Arc<dyn SessionStore>>,
    session: Mutex<Session>,
    renewals: AtomicUsize,
}

#[derive(Default)]
struct Session {
    token: Option<SessionToken>,
    cookies: Vec<(String, String)>,
    established: bool,
}

impl SessionAuthenticator {
    /// Create an authenticator for one credential mode.
    pub fn new(credentials: Credentials) -> Self {
        let token = match &credentials {
            Credentials::Session(token) => Some(token.clone()),
            _ => None,
        };
        Self {
            credentials: Some(credentials),
            probe: None,
            store: None,
            session: Mutex::new(Session {
                token,
                ..Session::default()
            }),
            renewals: AtomicUsize::new(0),
        }
    }

    /// An authenticator with no session credentials.
    ///
    /// Requests go out bare, so the transport's credential provider (if any)
    /// supplies authorization.
    pub fn anonymous() -> Self {
        Self {
            credentials: None,
            probe: None,
            store: None,
            session: Mutex::new(Session::default()),
            renewals: AtomicUsize::new(0),
        }
    }

    /// Select credentials from configuration, falling back to the session
    /// persisted in `store` when nothing is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoCredentials`] when neither configuration nor
    /// store provide a credential.
    pub async fn from_config(
        config: &AuthConfig,
        store: Option<Arc<dyn SessionStore>>,
    ) -> Result<Self> {
        let saved = match (&store, config.is_empty()) {
            (Some(store), true) => store.load().await?,
            _ => None,
        };
        let credentials = config.select(saved.as_ref())?;
        debug!(mode = %credentials.mode(), "selected credential mode");

        let mut authenticator = Self::new(credentials);
        authenticator.store = store;
        Ok(authenticator)
    }

    /// Renew sessions by calling `path`.
    pub fn with_probe(mut self, path: impl Into<String>) -> Self {
        self.probe = Some(path.into());
        self
    }

    /// Persist renewed sessions to `store`.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The active credential mode.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoCredentials`] for an anonymous authenticator.
    pub fn credentials(&self) -> std::result::Result<&Credentials, AuthError> {
        self.credentials.as_ref().ok_or(AuthError::NoCredentials)
    }

    /// Establish the session on `host`.
    ///
    /// Fails with [`AuthError::NoCredentials`] when no credential mode is
    /// configured. With a probe path this always renews, including for a
    /// reused session token, whose validity is checked by the probe.
    #[instrument(skip(self, transport), fields(host = %host))]
    pub async fn authenticate<T>(&self, transport: &T, host: &HostUrl) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        let credentials = self.credentials()?;
        info!(mode = %credentials.mode(), "authenticating");
        self.renew(transport, host).await
    }

    /// Whether a `401` can be answered with a renewal: needs both a probe
    /// path and credentials.
    pub fn can_renew(&self) -> bool {
        self.probe.is_some() && self.credentials.is_some()
    }

    /// Renew once if no session has been established yet.
    pub async fn ensure<T>(&self, transport: &T, host: &HostUrl) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        if !self.can_renew() {
            return Ok(());
        }
        if self.session.lock().await.established {
            return Ok(());
        }
        self.renew(transport, host).await
    }

    /// Exchange the credentials for a fresh session.
    ///
    /// Replaces the cookie jar with the cookies of the probe response. If the
    /// server sets no `SESSION` cookie the previously held token is kept.
    /// Safe to call repeatedly. Does nothing without a probe path.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Rejected`] if the probe answers `401`
    /// - [`Error::Http`] for any other status >= 400
    /// - transport errors as returned by the transport
    #[instrument(skip(self, transport), fields(host = %host))]
    pub async fn renew<T>(&self, transport: &T, host: &HostUrl) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        let Some(probe) = &self.probe else {
            return Ok(());
        };
        let credentials = self.credentials()?;
        self.renewals.fetch_add(1, Ordering::Relaxed);

        let auth = match credentials {
            Credentials::Session(configured) => {
                let session = self.session.lock().await;
                RequestAuth::session(session.token.as_ref().unwrap_or(configured))
            }
            Credentials::Header(token) => RequestAuth::Header(token.clone()),
            Credentials::Basic { username, password } => RequestAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
        };
        debug!(mode = %credentials.mode(), %probe, "renewing session");

        let response = transport.send(host, &Request::get(probe), &auth).await?;
        if response.status == 401 {
            warn!("session renewal rejected");
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.text(),
            }
            .into());
        }
        if !response.is_success() {
            return Err(Error::Http(response.into_http_error()));
        }

        let token = {
            let mut session = self.session.lock().await;
            let mut cookies = response.cookies();
            let token = response
                .cookie(SESSION_COOKIE)
                .map(SessionToken::new)
                .or_else(|| session.token.clone())
                .or_else(|| match credentials {
                    Credentials::Session(token) => Some(token.clone()),
                    _ => None,
                });
            if let Some(token) = &token {
                if !cookies.iter().any(|(name, _)| name == SESSION_COOKIE) {
                    cookies.push((SESSION_COOKIE.to_string(), token.as_str().to_string()));
                }
            }
            session.token = token.clone();
            session.cookies = cookies;
            session.established = true;
            token
        };
        info!(has_token = token.is_some(), "session established");

        if let (Some(store), Some(token)) = (&self.store, &token) {
            if let Err(e) = store.save(token).await {
                warn!(error = %e, "failed to persist session");
            }
        }
        Ok(())
    }

    /// Drop the session token and cookies.
    pub async fn invalidate(&self) {
        let mut session = self.session.lock().await;
        session.token = None;
        session.cookies.clear();
        session.established = false;
        debug!("session invalidated");
    }

    /// Credentials to attach to the next request.
    ///
    /// The cookie jar once a session is established, otherwise the primary
    /// credentials.
    pub async fn request_auth(&self) -> RequestAuth {
        let session = self.session.lock().await;
        if !session.cookies.is_empty() {
            return RequestAuth::Cookies(session.cookies.clone());
        }
        match &self.credentials {
            None => RequestAuth::None,
            Some(Credentials::Session(configured)) => {
                RequestAuth::session(session.token.as_ref().unwrap_or(configured))
            }
            Some(Credentials::Header(token)) => RequestAuth::Header(token.clone()),
            Some(Credentials::Basic { username, password }) => RequestAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
        }
    }

    /// The current session token, if any.
    pub async fn token(&self) -> Option<SessionToken> {
        self.session.lock().await.token.clone()
    }

    /// How many renewals were attempted.
    pub fn renewal_count(&self) -> usize {
        self.renewals.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("credentials", &self.credentials)
            .field("probe", &self.probe)
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
