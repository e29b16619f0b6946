//! cdpm - CLI tool for querying Cloudera cluster services.
//!
//! A thin wrapper over `cdpm-http`: each subcommand builds one service
//! client from the YAML configuration and prints its results as JSON lines.

mod cli;
mod commands;
mod config;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{cm, hdfs, hue, ranger, spark, yarn};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let config = Config::load(cli.config_file.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Cm(cmd) => cm::handle(cmd, &config).await,
        Commands::Ranger(cmd) => ranger::handle(cmd, &config).await,
        Commands::Yarn(cmd) => yarn::handle(cmd, &config).await,
        Commands::Hdfs(cmd) => hdfs::handle(cmd, &config).await,
        Commands::Spark(cmd) => spark::handle(cmd, &config).await,
        Commands::Hue(cmd) => hue::handle(cmd, &config).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
