//! Ordered list of interchangeable hosts.

use std::fmt;

use crate::error::{Error, InvalidInputError};

use super::HostUrl;

/// An ordered, non-empty list of equivalent backend hosts.
///
/// The order is the order in which failover tries the hosts. It only
/// changes through [`HostList::promote`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostList(Vec<HostUrl>);

impl HostList {
    /// Create a host list.
    ///
    /// # Errors
    ///
    /// Returns an error if `hosts` is empty.
    pub fn new(hosts: Vec<HostUrl>) -> Result<Self, Error> {
        if hosts.is_empty() {
            return Err(InvalidInputError::EmptyHostList.into());
        }
        Ok(Self(hosts))
    }

    /// A list with a single host.
    pub fn single(host: HostUrl) -> Self {
        Self(vec![host])
    }

    /// Parse a list of URL strings.
    pub fn parse<I, S>(hosts: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(HostUrl::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(hosts)
    }

    /// Move `host` to the front, keeping the relative order of the rest.
    ///
    /// Returns false if the host is not in the list or already first.
    pub fn promote(&mut self, host: &HostUrl) -> bool {
        match self.0.iter().position(|h| h == host) {
            Some(0) | None => false,
            Some(n) => {
                let host = self.0.remove(n);
                self.0.insert(0, host);
                true
            }
        }
    }

    /// The host tried first.
    pub fn primary(&self) -> &HostUrl {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HostUrl> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[HostUrl] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a HostList {
    type Item = &'a HostUrl;
    type IntoIter = std::slice::Iter<'a, HostUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for HostList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hosts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", hosts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> HostList {
        HostList::parse(["http://a:1", "http://b:1", "http://c:1"]).unwrap()
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(HostList::new(Vec::new()).is_err());
    }

    #[test]
    fn promote_moves_host_to_front() {
        let mut list = hosts();
        let c = list.as_slice()[2].clone();
        assert!(list.promote(&c));
        assert_eq!(list.to_string(), "[http://c:1, http://a:1, http://b:1]");
    }

    #[test]
    fn promote_first_or_unknown_is_noop() {
        let mut list = hosts();
        let a = list.primary().clone();
        assert!(!list.promote(&a));
        assert!(!list.promote(&HostUrl::new("http://z:1").unwrap()));
        assert_eq!(list, hosts());
    }
}
