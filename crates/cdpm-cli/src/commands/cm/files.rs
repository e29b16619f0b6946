//! File browser export command implementation.

use anyhow::{Context, Result};
use clap::Args;

use super::{AuthArgs, connect};
use crate::commands::hint;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FilesArgs {
    /// HDFS directory to list
    pub path: String,
}

pub async fn run(args: FilesArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let csv = cm
        .file_browser(&args.path)
        .await
        .map_err(hint)
        .with_context(|| format!("Failed to list {}", args.path))?;
    print!("{}", csv);
    Ok(())
}
