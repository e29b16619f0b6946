//! Opaque credential tokens.

use std::fmt;

/// A session token (the `SESSION` cookie value).
///
/// Obtained by exchanging primary credentials against the probe endpoint
/// and replayed as a cookie on subsequent requests.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a new session token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in cookie headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

/// A pre-encoded authorization token.
///
/// Sent literally as `Authorization: Basic <token>`. The value is whatever
/// the operator supplied; it is not re-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderToken(String);

impl HeaderToken {
    /// Create a new header token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the full `Authorization` header value.
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl fmt::Debug for HeaderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HeaderToken").field(&"[REDACTED]").finish()
    }
}
