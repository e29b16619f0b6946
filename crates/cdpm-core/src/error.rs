//! Error types for the cdpm libraries.
//!
//! The taxonomy separates failures by how the resilient layer reacts to
//! them: transport errors may be retried, authentication errors are
//! absorbed once, and HTTP errors always propagate.

use std::fmt;
use thiserror::Error;

/// The unified error type for cdpm operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection-level failures (refused, reset, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No usable credentials, or the server rejected renewed credentials.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Any non-401 response with status >= 400.
    #[error("{0}")]
    Http(#[from] HttpError),

    /// Every configured host failed for one logical operation.
    #[error("{0}")]
    ExhaustedHosts(#[from] ExhaustedHostsError),

    /// The requested application does not exist on the history server.
    #[error("application not found: {app_id}")]
    ApplicationNotFound { app_id: String },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Input validation errors (bad host URL, empty host list).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The session persistence collaborator failed.
    #[error("session store error: {0}")]
    Store(String),
}

impl Error {
    /// Returns true for failures a retry may fix.
    ///
    /// Only connection-level errors qualify. An exhausted host list counts
    /// when the last host failed at the connection level.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(err) => err.is_transient(),
            Error::ExhaustedHosts(err) => matches!(
                &err.last,
                Some(HostFailure::Transport(t)) if t.is_transient()
            ),
            _ => false,
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http(err) => Some(err.status),
            Error::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            Error::ExhaustedHosts(err) => err.last_status(),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused, reset, or DNS failure.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// The connection dropped while reading the body.
    #[error("failed to read response body: {message}")]
    Body { message: String },

    /// The request could not be built or sent (not retried).
    #[error("request failed: {message}")]
    Request { message: String },
}

impl TransportError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Request { .. })
    }
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential mode is configured.
    #[error("no usable credentials configured")]
    NoCredentials,

    /// The server rejected the credentials after a renewal.
    #[error("credentials rejected with HTTP {status}")]
    Rejected { status: u16, body: String },
}

/// An HTTP response with a failure status.
///
/// Headers and body are captured verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body text.
    pub body: String,
}

impl HttpError {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        let body = self.body.trim();
        if !body.is_empty() {
            write!(f, ": {}", body)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

/// The failure observed on one host during failover.
#[derive(Debug, Clone)]
pub enum HostFailure {
    /// The host answered with status >= 400.
    Http(HttpError),
    /// The host could not be reached.
    Transport(TransportError),
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFailure::Http(err) => err.fmt(f),
            HostFailure::Transport(err) => err.fmt(f),
        }
    }
}

/// Every host in a host list failed for one logical operation.
#[derive(Debug, Clone)]
pub struct ExhaustedHostsError {
    /// Number of hosts tried.
    pub tried: usize,
    /// The last failure observed.
    pub last: Option<HostFailure>,
}

impl ExhaustedHostsError {
    pub fn last_status(&self) -> Option<u16> {
        match &self.last {
            Some(HostFailure::Http(err)) => Some(err.status),
            _ => None,
        }
    }

    pub fn last_headers(&self) -> &[(String, String)] {
        match &self.last {
            Some(HostFailure::Http(err)) => &err.headers,
            _ => &[],
        }
    }

    pub fn last_body(&self) -> Option<&str> {
        match &self.last {
            Some(HostFailure::Http(err)) => Some(&err.body),
            _ => None,
        }
    }
}

impl fmt::Display for ExhaustedHostsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} hosts failed", self.tried)?;
        if let Some(ref last) = self.last {
            write!(f, ", last error: {}", last)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExhaustedHostsError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid host URL.
    #[error("invalid host URL '{value}': {reason}")]
    HostUrl { value: String, reason: String },

    /// A host list must contain at least one host.
    #[error("host list is empty")]
    EmptyHostList,

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
