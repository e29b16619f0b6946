//! Base URL of one backend host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL for one backend instance.
///
/// Cluster services commonly run plain HTTP on internal hosts, so both
/// `http` and `https` are accepted. Trailing slashes are dropped so that
/// [`HostUrl::join`] produces a single separator.
///
/// # Example
///
/// ```
/// use cdpm_core::HostUrl;
///
/// let host = HostUrl::new("https://cm.example.com:7183/").unwrap();
/// assert_eq!(host.join("/api/v41/clusters"),
///            "https://cm.example.com:7183/api/v41/clusters");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostUrl(Url);

impl HostUrl {
    /// Create a new host URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute, has no host, or uses a
    /// scheme other than `http`/`https`.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref().trim();
        let url = Url::parse(s).map_err(|e| InvalidInputError::HostUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the absolute URL for a path on this host.
    ///
    /// Paths are appended to the base path, so a host configured as
    /// `https://hue:8888/queryprocessor` keeps its prefix.
    pub fn join(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::HostUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        if scheme != "https" && scheme != "http" {
            return Err(InvalidInputError::HostUrl {
                value: original.to_string(),
                reason: format!("unsupported scheme '{}'", scheme),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::HostUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for HostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}

impl FromStr for HostUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for HostUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for HostUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HostUrl::new(&s).map_err(serde::de::Error::custom)
    }
}
