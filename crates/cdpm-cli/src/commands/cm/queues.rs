//! YARN Queue Manager commands.

use anyhow::{Context, Result};
use cdpm_http::services::AclChange;
use clap::{Args, Subcommand};

use super::{AuthArgs, connect};
use crate::commands::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct QueuesCommand {
    #[command(subcommand)]
    pub command: QueuesSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum QueuesSubcommand {
    /// List queues of the default partition
    List(ListArgs),

    /// Add or remove users and groups in a queue's ACLs
    Acl(AclArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct AclArgs {
    /// Queue path, e.g. root.etl
    pub queue: String,

    /// User to add (`+name` or `name`) or remove (`-name`)
    #[arg(long = "user", value_name = "[+|-]NAME", allow_hyphen_values = true)]
    pub users: Vec<AclChange>,

    /// Group to add (`+name` or `name`) or remove (`-name`)
    #[arg(long = "group", value_name = "[+|-]NAME", allow_hyphen_values = true)]
    pub groups: Vec<AclChange>,
}

pub async fn handle(cmd: QueuesCommand, auth: &AuthArgs, config: &Config) -> Result<()> {
    match cmd.command {
        QueuesSubcommand::List(args) => list(args, auth, config).await,
        QueuesSubcommand::Acl(args) => acl(args, auth, config).await,
    }
}

async fn list(args: ListArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let queues = cm
        .queue_config()
        .await
        .map_err(hint)
        .context("Failed to fetch queue config")?;
    for queue in &queues {
        output::emit(queue, args.pretty)?;
    }
    Ok(())
}

async fn acl(args: AclArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    if args.users.is_empty() && args.groups.is_empty() {
        anyhow::bail!("Nothing to change; pass --user or --group");
    }
    let cm = connect(auth, config).await?;
    let updated = cm
        .update_queue_acls(&args.queue, &args.users, &args.groups)
        .await
        .map_err(hint)
        .with_context(|| format!("Failed to update ACLs of {}", args.queue))?;

    match updated {
        Some(acl) => {
            output::success(&format!("Updated ACLs of {}", args.queue));
            output::field("ACL", &acl.to_string());
        }
        None => output::warning(&format!("ACLs of {} already up to date", args.queue)),
    }
    Ok(())
}
