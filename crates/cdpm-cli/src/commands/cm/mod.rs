//! Cloudera Manager subcommands.

mod files;
mod list;
mod login;
mod queues;
mod rebalance;
mod timeseries;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cdpm_core::{AuthConfig, SessionStore};
use cdpm_http::services::{CM_PROBE_PATH, CmClient};
use cdpm_http::{ResilientClient, SessionAuthenticator};
use clap::{Args, Subcommand};

use super::{hint, parse_user};
use crate::config::Config;
use crate::session::FileSessionStore;

#[derive(Args, Debug)]
pub struct CmCommand {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(subcommand)]
    pub command: CmSubcommand,
}

/// Credential flags, highest priority first: session, token, user.
#[derive(Args, Debug, Default, Clone)]
pub struct AuthArgs {
    /// YAML file with `session`, `header` or `username`/`password`
    #[arg(short = 'c', long = "auth-file", global = true)]
    pub auth_file: Option<PathBuf>,

    /// Username and password
    #[arg(short = 'u', long = "user", value_name = "USER:PASS", global = true)]
    pub user: Option<String>,

    /// Existing SESSION cookie
    #[arg(short = 's', long = "session", global = true)]
    pub session: Option<String>,

    /// Pre-encoded basic auth token
    #[arg(short = 't', long = "token", value_name = "BASE64_TOKEN", global = true)]
    pub token: Option<String>,

    /// Where the session is saved (defaults to session.json in the user data directory)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,
}

impl AuthArgs {
    /// The credential settings that win: command-line flags, then the auth
    /// file, then `cm.auth` from the config.
    pub fn resolve(&self, configured: &AuthConfig) -> Result<AuthConfig> {
        let mut flags = AuthConfig {
            session: self.session.clone(),
            header: self.token.clone(),
            ..AuthConfig::default()
        };
        if let Some(user) = &self.user {
            let (username, password) = parse_user(user)?;
            flags.username = username;
            flags.password = password;
        }
        if !flags.is_empty() {
            return Ok(flags);
        }

        if let Some(path) = &self.auth_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read auth file {}", path.display()))?;
            let from_file: AuthConfig = serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid auth file {}", path.display()))?;
            if !from_file.is_empty() {
                return Ok(from_file);
            }
        }

        Ok(configured.clone())
    }

    pub fn session_store(&self) -> Result<FileSessionStore> {
        match &self.session_file {
            Some(path) => Ok(FileSessionStore::new(path)),
            None => FileSessionStore::default_location(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CmSubcommand {
    /// Authenticate and save the session
    Login(login::LoginArgs),

    /// List hosts
    Hosts(list::ListArgs),

    /// List unhealthy checks and entities
    HealthIssues(list::ListArgs),

    /// List authorization roles
    Roles(list::ListArgs),

    /// Show one command
    Command(list::CommandArgs),

    /// Run a time-series query
    Timeseries(timeseries::TimeseriesArgs),

    /// Start or stop the HDFS balancer
    Rebalance(rebalance::RebalanceCommand),

    /// Export a file browser listing as CSV
    Files(files::FilesArgs),

    /// Inspect and edit YARN Queue Manager queues
    Queues(queues::QueuesCommand),
}

pub async fn handle(cmd: CmCommand, config: &Config) -> Result<()> {
    let auth = cmd.auth;
    match cmd.command {
        CmSubcommand::Login(args) => login::run(args, &auth, config).await,
        CmSubcommand::Hosts(args) => list::hosts(args, &auth, config).await,
        CmSubcommand::HealthIssues(args) => list::health_issues(args, &auth, config).await,
        CmSubcommand::Roles(args) => list::roles(args, &auth, config).await,
        CmSubcommand::Command(args) => list::command(args, &auth, config).await,
        CmSubcommand::Timeseries(args) => timeseries::run(args, &auth, config).await,
        CmSubcommand::Rebalance(args) => rebalance::handle(args, &auth, config).await,
        CmSubcommand::Files(args) => files::run(args, &auth, config).await,
        CmSubcommand::Queues(args) => queues::handle(args, &auth, config).await,
    }
}

/// Build a session-authenticated Cloudera Manager client.
pub(crate) async fn connect(auth: &AuthArgs, config: &Config) -> Result<CmClient> {
    let settings = auth.resolve(&config.cm.auth)?;
    let store: Arc<dyn SessionStore> = Arc::new(auth.session_store()?);
    let authenticator = SessionAuthenticator::from_config(&settings, Some(store))
        .await
        .map_err(hint)?
        .with_probe(CM_PROBE_PATH);

    let client = ResilientClient::new(config.transport()?, config.cm_hosts()?, authenticator)
        .with_retry(config.retry_policy());
    Ok(CmClient::new(client, config.cm.options.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_win_over_configured_auth() {
        let configured = AuthConfig {
            session: Some("from-config".into()),
            ..AuthConfig::default()
        };
        let args = AuthArgs {
            user: Some("admin:secret".into()),
            ..AuthArgs::default()
        };
        let resolved = args.resolve(&configured).unwrap();
        assert_eq!(resolved.username, "admin");
        assert_eq!(resolved.password, "secret");
        assert!(resolved.session.is_none());
    }

    #[test]
    fn auth_file_wins_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.yaml");
        fs::write(&path, "header: dG9rZW4=\n").unwrap();

        let configured = AuthConfig {
            username: "config-user".into(),
            ..AuthConfig::default()
        };
        let args = AuthArgs {
            auth_file: Some(path),
            ..AuthArgs::default()
        };
        let resolved = args.resolve(&configured).unwrap();
        assert_eq!(resolved.header.as_deref(), Some("dG9rZW4="));
        assert!(resolved.username.is_empty());
    }

    #[test]
    fn config_is_the_last_explicit_source() {
        let configured = AuthConfig {
            username: "config-user".into(),
            ..AuthConfig::default()
        };
        let resolved = AuthArgs::default().resolve(&configured).unwrap();
        assert_eq!(resolved.username, "config-user");
    }
}
