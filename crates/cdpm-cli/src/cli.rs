//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::cm::CmCommand;
use crate::commands::hdfs::HdfsCommand;
use crate::commands::hue::HueCommand;
use crate::commands::ranger::RangerCommand;
use crate::commands::spark::SparkCommand;
use crate::commands::yarn::YarnCommand;

/// Query Cloudera Manager and the cluster services it manages.
#[derive(Parser, Debug)]
#[command(name = "cdpm")]
#[command(author, version = env!("CDPM_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file (defaults to config.yaml in the user config directory)
    #[arg(long, global = true, env = "CDPM_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cloudera Manager operations
    Cm(CmCommand),

    /// Ranger admin listings
    Ranger(RangerCommand),

    /// YARN ResourceManager queries
    Yarn(YarnCommand),

    /// HDFS NameNode queries
    Hdfs(HdfsCommand),

    /// Spark History Server queries
    Spark(SparkCommand),

    /// HUE query processor queries
    Hue(HueCommand),
}
