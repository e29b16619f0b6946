//! Subcommand implementations, one module per service.

pub mod cm;
pub mod hdfs;
pub mod hue;
pub mod ranger;
pub mod spark;
pub mod yarn;

use anyhow::{Result, anyhow};
use cdpm_core::Page;
use cdpm_core::error::AuthError;
use futures_util::{Stream, StreamExt, pin_mut};
use serde::Serialize;

use crate::output;

/// Turn a library error into a CLI error, with a hint for the failures a
/// user can fix.
pub(crate) fn hint(err: cdpm_core::Error) -> anyhow::Error {
    let message = match &err {
        cdpm_core::Error::Auth(AuthError::NoCredentials) => Some(
            "No credentials configured. Pass -u USER:PASS, -s SESSION or -t TOKEN, \
             or set `cm.auth` in the config file.",
        ),
        cdpm_core::Error::Auth(AuthError::Rejected { .. }) => {
            Some("The server rejected the credentials. Check them, or run 'cdpm cm login' again.")
        }
        _ => None,
    };
    match message {
        Some(message) => anyhow::Error::new(err).context(message),
        None => anyhow::Error::new(err),
    }
}

/// Split a `USER:PASS` argument.
pub(crate) fn parse_user(value: &str) -> Result<(String, String)> {
    value
        .split_once(':')
        .map(|(user, pass)| (user.to_string(), pass.to_string()))
        .ok_or_else(|| anyhow!("expected USER:PASS, got '{}'", value))
}

/// Parse a `key=value` argument.
pub(crate) fn parse_key_value(value: &str) -> std::result::Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", value))
}

/// Print every item of a paged listing, returning how many were printed.
pub(crate) async fn emit_pages<T, S>(pages: S, pretty: bool) -> Result<usize>
where
    T: Serialize,
    S: Stream<Item = cdpm_core::Result<Page<T>>>,
{
    pin_mut!(pages);
    let mut count = 0;
    while let Some(page) = pages.next().await {
        let page = page.map_err(hint)?;
        for item in &page.items {
            output::emit(item, pretty)?;
        }
        count += page.items.len();
    }
    Ok(count)
}
