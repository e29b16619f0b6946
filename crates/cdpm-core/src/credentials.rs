//! Credential configuration and mode selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::tokens::{HeaderToken, SessionToken};

/// The single active credential mode of a client.
///
/// Exactly one variant is active per client instance. Build it with
/// [`AuthConfig::select`], which applies the priority order.
#[derive(Clone)]
pub enum Credentials {
    /// Replay an existing `SESSION` cookie.
    Session(SessionToken),
    /// Send a pre-encoded `Authorization: Basic <token>` header.
    Header(HeaderToken),
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

/// Discriminant of [`Credentials`], safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Session,
    Header,
    Basic,
}

impl fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialMode::Session => "session",
            CredentialMode::Header => "header",
            CredentialMode::Basic => "basic",
        };
        f.write_str(name)
    }
}

impl Credentials {
    /// Create basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns which mode is active.
    pub fn mode(&self) -> CredentialMode {
        match self {
            Credentials::Session(_) => CredentialMode::Session,
            Credentials::Header(_) => CredentialMode::Header,
            Credentials::Basic { .. } => CredentialMode::Basic,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Session(token) => f.debug_tuple("Session").field(token).finish(),
            Credentials::Header(token) => f.debug_tuple("Header").field(token).finish(),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Authentication settings as they appear in configuration files.
///
/// Any combination of fields may be set; [`AuthConfig::select`] picks the
/// one that wins. Empty strings count as absent.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl AuthConfig {
    /// Returns true if no credential field is set.
    pub fn is_empty(&self) -> bool {
        non_empty(&self.session).is_none()
            && non_empty(&self.header).is_none()
            && self.username.is_empty()
    }

    /// Select the credential mode to use.
    ///
    /// Priority: explicit session token, then header token, then
    /// username/password, then `saved` (a session persisted by an earlier run).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoCredentials`] when nothing is configured.
    pub fn select(&self, saved: Option<&SessionToken>) -> Result<Credentials, AuthError> {
        if let Some(session) = non_empty(&self.session) {
            return Ok(Credentials::Session(SessionToken::new(session)));
        }
        if let Some(header) = non_empty(&self.header) {
            return Ok(Credentials::Header(HeaderToken::new(header)));
        }
        if !self.username.is_empty() {
            return Ok(Credentials::basic(&self.username, &self.password));
        }
        saved
            .cloned()
            .map(Credentials::Session)
            .ok_or(AuthError::NoCredentials)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("AuthConfig")
            .field("session", &redact(&self.session))
            .field("header", &redact(&self.header))
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
