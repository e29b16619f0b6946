//! Spark History Server subcommands.

use anyhow::{Context, Result};
use cdpm_http::services::{AppStatus, ApplicationFilter, SparkHistoryClient};
use cdpm_http::{ResilientClient, SessionAuthenticator};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use futures_util::{StreamExt, pin_mut};
use serde_json::json;

use super::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct SparkCommand {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: SparkSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SparkSubcommand {
    /// List applications
    Apps(AppsArgs),

    /// Show the environment of one or more applications
    Env(EnvArgs),
}

#[derive(Args, Debug)]
pub struct AppsArgs {
    /// completed or running
    #[arg(long)]
    pub status: Option<AppStatus>,

    /// Started at or after (RFC 3339)
    #[arg(long)]
    pub min_date: Option<DateTime<Utc>>,

    /// Started at or before (RFC 3339)
    #[arg(long)]
    pub max_date: Option<DateTime<Utc>>,

    /// Ended at or after (RFC 3339)
    #[arg(long)]
    pub min_end_date: Option<DateTime<Utc>>,

    /// Ended at or before (RFC 3339)
    #[arg(long)]
    pub max_end_date: Option<DateTime<Utc>>,

    /// Maximum number of applications
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Application IDs
    #[arg(required = true)]
    pub app_ids: Vec<String>,
}

pub async fn handle(cmd: SparkCommand, config: &Config) -> Result<()> {
    let client = ResilientClient::new(
        config.transport()?,
        config.spark_hosts()?,
        SessionAuthenticator::anonymous(),
    )
    .with_retry(config.retry_policy());
    let spark = SparkHistoryClient::new(client);

    match cmd.command {
        SparkSubcommand::Apps(args) => {
            let filter = ApplicationFilter {
                status: args.status,
                min_date: args.min_date,
                max_date: args.max_date,
                min_end_date: args.min_end_date,
                max_end_date: args.max_end_date,
                limit: args.limit,
            };
            let apps = spark
                .applications(&filter)
                .await
                .map_err(hint)
                .context("Failed to list applications")?;
            if apps.is_empty() {
                eprintln!("{}", "No applications found.".dimmed());
            }
            for app in &apps {
                output::emit(app, cmd.pretty)?;
            }
            Ok(())
        }
        SparkSubcommand::Env(args) => {
            let environments = spark.environments(args.app_ids, config.http.fan_out);
            pin_mut!(environments);
            while let Some((app_id, env)) = environments.next().await {
                match env {
                    Ok(env) => {
                        output::emit(&json!({"id": app_id, "environment": env}), cmd.pretty)?
                    }
                    Err(cdpm_core::Error::ApplicationNotFound { .. }) => {
                        output::warning(&format!("Application {} not found", app_id))
                    }
                    Err(err) => {
                        return Err(hint(err))
                            .with_context(|| format!("Failed to fetch environment of {}", app_id));
                    }
                }
            }
            Ok(())
        }
    }
}
