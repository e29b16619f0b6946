//! Read-only Cloudera Manager listings.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::{AuthArgs, connect};
use crate::commands::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Command ID
    pub id: u64,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn hosts(args: ListArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let hosts = cm.hosts().await.map_err(hint).context("Failed to list hosts")?;

    if hosts.is_empty() {
        eprintln!("{}", "No hosts found.".dimmed());
    }
    for host in &hosts {
        output::emit(host, args.pretty)?;
    }
    Ok(())
}

pub async fn health_issues(args: ListArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let issues = cm
        .health_issues()
        .await
        .map_err(hint)
        .context("Failed to fetch health issues")?;
    output::emit(&issues, args.pretty)
}

pub async fn roles(args: ListArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let roles = cm
        .auth_roles()
        .await
        .map_err(hint)
        .context("Failed to list roles")?;
    for role in &roles {
        output::emit(role, args.pretty)?;
    }
    Ok(())
}

pub async fn command(args: CommandArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let command = cm
        .command(args.id)
        .await
        .map_err(hint)
        .with_context(|| format!("Failed to fetch command {}", args.id))?;
    output::emit(&command, args.pretty)
}
