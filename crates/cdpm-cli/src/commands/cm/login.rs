//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::{AuthArgs, connect};
use crate::commands::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {}

pub async fn run(_args: LoginArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let store = auth.session_store()?;

    eprintln!("{}", "Logging in...".dimmed());

    cm.client()
        .authenticate()
        .await
        .map_err(hint)
        .context("Failed to login")?;

    let mode = cm.client().authenticator().credentials().map_err(|e| hint(e.into()))?.mode();

    output::success("Logged in successfully");
    output::field("Host", cm.client().hosts().await.primary().as_str());
    output::field("Mode", &mode.to_string());
    output::field("Session file", &store.path().display().to_string());

    Ok(())
}
