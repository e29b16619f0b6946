//! HUE query processor subcommands.

use anyhow::{Context, Result};
use cdpm_http::services::{HueQpClient, QuerySearch};
use cdpm_http::{ResilientClient, SessionAuthenticator};
use clap::{Args, Subcommand};
use colored::Colorize;
use futures_util::{StreamExt, pin_mut};
use serde_json::{Value, json};

use super::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct HueCommand {
    /// Act as this user (defaults to `hue.username`)
    #[arg(long, global = true)]
    pub do_as: Option<String>,

    #[command(subcommand)]
    pub command: HueSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum HueSubcommand {
    /// Search the Hive query history
    Queries(QueriesArgs),
}

#[derive(Args, Debug)]
pub struct QueriesArgs {
    /// Window start, epoch milliseconds
    #[arg(long)]
    pub start: i64,

    /// Window end, epoch milliseconds
    #[arg(long)]
    pub end: i64,

    /// Free-text filter
    #[arg(long, default_value = "")]
    pub text: String,

    /// Also fetch the extended details of every query
    #[arg(long)]
    pub details: bool,

    /// Override the page size
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn handle(cmd: HueCommand, config: &Config) -> Result<()> {
    let do_as = cmd.do_as.unwrap_or_else(|| config.hue.username.clone());
    let client = ResilientClient::new(
        config.transport()?,
        config.hue_hosts()?,
        SessionAuthenticator::anonymous(),
    )
    .with_retry(config.retry_policy());

    match cmd.command {
        HueSubcommand::Queries(args) => {
            let mut hue = HueQpClient::new(client, do_as);
            if let Some(size) = args.page_size {
                hue = hue.with_page_size(size);
            }
            queries(&hue, args, config.http.fan_out).await
        }
    }
}

async fn queries(hue: &HueQpClient, args: QueriesArgs, fan_out: usize) -> Result<()> {
    let search = QuerySearch {
        start_time: args.start,
        end_time: args.end,
        text: args.text.clone(),
    };

    let mut ids = Vec::new();
    {
        let pages = hue.search(&search);
        pin_mut!(pages);
        while let Some(page) = pages.next().await {
            let page = page.map_err(hint).context("Failed to search queries")?;
            for query in page.items {
                if args.details {
                    if let Some(id) = query_id(&query) {
                        ids.push(id);
                    }
                } else {
                    output::emit(&query, args.pretty)?;
                }
            }
        }
    }

    if !args.details {
        return Ok(());
    }
    if ids.is_empty() {
        eprintln!("{}", "No queries found.".dimmed());
        return Ok(());
    }

    let details = hue.query_details(ids, fan_out);
    pin_mut!(details);
    while let Some((id, detail)) = details.next().await {
        let detail = detail
            .map_err(hint)
            .with_context(|| format!("Failed to fetch query {}", id))?;
        output::emit(&json!({"id": id, "detail": detail}), args.pretty)?;
    }
    Ok(())
}

fn query_id(query: &Value) -> Option<String> {
    query.get("queryId")?.as_str().map(str::to_string)
}
