//! Time-series query command implementation.

use anyhow::{Context, Result};
use cdpm_http::services::{MetricContentType, MetricRollup, TimeSeriesQuery};
use chrono::{DateTime, Utc};
use clap::Args;

use super::{AuthArgs, connect};
use crate::commands::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct TimeseriesArgs {
    /// tsquery expression, e.g. "select cpu_percent where entityName=host1"
    pub query: String,

    /// Window start (RFC 3339)
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,

    /// Window end (RFC 3339)
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,

    /// Desired rollup (raw, ten_minutely, hourly, six_hourly, daily, weekly)
    #[arg(long)]
    pub rollup: Option<MetricRollup>,

    /// Fail instead of falling back to another rollup
    #[arg(long, requires = "rollup")]
    pub force_rollup: bool,

    /// Print the server's CSV export instead of JSON
    #[arg(long)]
    pub csv: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: TimeseriesArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;

    let mut query = TimeSeriesQuery::new(&args.query);
    if let Some(from) = args.from {
        query = query.from(from);
    }
    if let Some(to) = args.to {
        query = query.to(to);
    }
    if let Some(rollup) = args.rollup {
        query = query.rollup(rollup, args.force_rollup.then_some(true));
    }

    if args.csv {
        let csv = cm
            .timeseries(&query.content_type(MetricContentType::Csv))
            .await
            .map_err(hint)
            .context("Time-series query failed")?;
        print!("{}", csv);
        return Ok(());
    }

    let data = cm
        .timedata(&query)
        .await
        .map_err(hint)
        .context("Time-series query failed")?;
    output::emit(&data, args.pretty)
}
