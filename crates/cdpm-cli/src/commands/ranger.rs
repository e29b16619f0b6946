//! Ranger admin subcommands.

use anyhow::{Context, Result};
use cdpm_core::Credentials;
use cdpm_http::services::{AuditQuery, RangerClient, UserQuery};
use cdpm_http::{ResilientClient, SessionAuthenticator};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::{emit_pages, parse_key_value, parse_user};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RangerCommand {
    /// Username and password (defaults to `ranger.username`/`ranger.password`)
    #[arg(short = 'u', long = "user", value_name = "USER:PASS", global = true)]
    pub user: Option<String>,

    /// Override the page size of the listing
    #[arg(long, global = true)]
    pub page_size: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: RangerSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RangerSubcommand {
    /// List access audit records, newest first
    Audits(AuditsArgs),

    /// List resource policies
    Policies(PoliciesArgs),

    /// List users
    Users(UsersArgs),
}

#[derive(Args, Debug)]
pub struct AuditsArgs {
    /// Ranger service (repository) name, e.g. cm_hdfs
    #[arg(long)]
    pub service: String,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct PoliciesArgs {
    /// Service type, e.g. hdfs or hive
    #[arg(long)]
    pub service_type: String,

    /// Extra filter passed through as a query parameter
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// User source: 0 internal, 1 external
    #[arg(long, default_value_t = 0)]
    pub source: u32,

    /// Restrict to a role, e.g. ROLE_SYS_ADMIN (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,
}

pub async fn handle(cmd: RangerCommand, config: &Config) -> Result<()> {
    let ranger = connect(&cmd, config)?;

    let count = match cmd.command {
        RangerSubcommand::Audits(args) => {
            let query = AuditQuery {
                service: args.service,
                start_date: args.start_date,
                end_date: args.end_date,
            };
            emit_pages(ranger.access_audit(&query), cmd.pretty)
                .await
                .context("Failed to list access audits")?
        }
        RangerSubcommand::Policies(args) => {
            emit_pages(ranger.policies(&args.service_type, &args.filters), cmd.pretty)
                .await
                .context("Failed to list policies")?
        }
        RangerSubcommand::Users(args) => {
            let query = UserQuery {
                source: args.source,
                roles: args.roles,
            };
            emit_pages(ranger.users(&query), cmd.pretty)
                .await
                .context("Failed to list users")?
        }
    };

    if count == 0 {
        eprintln!("{}", "No records found.".dimmed());
    }
    Ok(())
}

fn connect(cmd: &RangerCommand, config: &Config) -> Result<RangerClient> {
    let (username, password) = match &cmd.user {
        Some(user) => parse_user(user)?,
        None => (config.ranger.username.clone(), config.ranger.password.clone()),
    };
    if username.is_empty() {
        anyhow::bail!("No Ranger credentials. Pass -u USER:PASS or set `ranger.username`.");
    }

    let authenticator = SessionAuthenticator::new(Credentials::basic(username, password));
    let client = ResilientClient::new(config.transport()?, config.ranger_hosts()?, authenticator)
        .with_retry(config.retry_policy());
    let ranger = RangerClient::new(client);
    Ok(match cmd.page_size {
        Some(size) => ranger.with_page_size(size),
        None => ranger,
    })
}
