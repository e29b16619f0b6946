//! YAML configuration.
//!
//! Every client is built from an explicit [`Config`] value; nothing is read
//! from process-wide state after startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cdpm_core::{AuthConfig, HostList, StaticAuthorization};
use cdpm_http::services::CmOptions;
use cdpm_http::{DEFAULT_FAN_OUT, ReqwestTransport, RetryPolicy, TransportOptions};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Project directories used for the config file, saved session and
/// rebalance status.
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "cdpm").context("Could not determine home directory")
}

/// Path of the default configuration file.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.yaml"))
}

/// Path of a file in the data directory, creating the directory.
pub fn data_file(name: &str) -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    Ok(data_dir.join(name))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cm: CmConfig,
    pub ranger: RangerConfig,
    pub yarn: YarnConfig,
    pub hdfs: HdfsConfig,
    pub spark: SparkConfig,
    pub hue: HueConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CmConfig {
    pub host: Option<String>,
    #[serde(flatten)]
    pub options: CmOptions,
    /// Where the last started rebalance command is kept.
    pub rebalance_status: Option<PathBuf>,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangerConfig {
    pub host: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YarnConfig {
    pub rm_hosts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HdfsConfig {
    pub namenode_hosts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkConfig {
    pub history_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HueConfig {
    pub qp_host: Option<String>,
    /// User the query processor acts for (`x-do-as`).
    pub username: String,
}

impl Default for HueConfig {
    fn default() -> Self {
        Self {
            qp_host: None,
            username: "hue".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Cluster services usually run with self-signed certificates.
    pub verify_tls: bool,
    /// Unset means no timeout.
    pub timeout_secs: Option<u64>,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub fan_out: usize,
    /// `Authorization` value sent on requests without session credentials,
    /// e.g. a pre-negotiated `Negotiate` token.
    pub authorization: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            verify_tls: false,
            timeout_secs: None,
            retry_attempts: 3,
            retry_delay_secs: 5,
            fan_out: DEFAULT_FAN_OUT,
            authorization: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. The default path may be missing, in
    /// which case defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                bail!("Config file not found: {}", path.display());
            }
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn transport(&self) -> Result<ReqwestTransport> {
        let options = TransportOptions {
            timeout: self.http.timeout_secs.map(Duration::from_secs),
            verify_tls: self.http.verify_tls,
        };
        let transport =
            ReqwestTransport::with_options(&options).context("Failed to build HTTP client")?;
        Ok(match self.http.authorization.as_deref() {
            Some(value) if !value.is_empty() => {
                transport.with_credential_provider(Arc::new(StaticAuthorization::new(value)))
            }
            _ => transport,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.http.retry_attempts,
            Duration::from_secs(self.http.retry_delay_secs),
        )
    }

    pub fn cm_hosts(&self) -> Result<HostList> {
        single_host(self.cm.host.as_deref(), "cm.host")
    }

    pub fn ranger_hosts(&self) -> Result<HostList> {
        single_host(self.ranger.host.as_deref(), "ranger.host")
    }

    pub fn hue_hosts(&self) -> Result<HostList> {
        single_host(self.hue.qp_host.as_deref(), "hue.qp_host")
    }

    pub fn yarn_hosts(&self) -> Result<HostList> {
        host_list(&self.yarn.rm_hosts, "yarn.rm_hosts")
    }

    pub fn namenode_hosts(&self) -> Result<HostList> {
        host_list(&self.hdfs.namenode_hosts, "hdfs.namenode_hosts")
    }

    pub fn spark_hosts(&self) -> Result<HostList> {
        host_list(&self.spark.history_hosts, "spark.history_hosts")
    }

    /// File holding the last started rebalance command.
    pub fn rebalance_status_path(&self) -> Result<PathBuf> {
        match &self.cm.rebalance_status {
            Some(path) => Ok(path.clone()),
            None => data_file("rebalance.json"),
        }
    }
}

fn single_host(host: Option<&str>, key: &str) -> Result<HostList> {
    match host {
        Some(host) if !host.is_empty() => host_list(&[host], key),
        _ => bail!("No host configured; set `{}` in the config file", key),
    }
}

fn host_list<S: AsRef<str>>(hosts: &[S], key: &str) -> Result<HostList> {
    if hosts.is_empty() {
        bail!("No hosts configured; set `{}` in the config file", key);
    }
    HostList::parse(hosts.iter().map(|h| h.as_ref()))
        .with_context(|| format!("Invalid `{}`", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
cm:
  host: https://cm.example.com:7183
  api_version: 48
  cluster_name: prod
  rebalance_role: hdfs-BALANCER-1
  auth:
    username: admin
    password: secret
yarn:
  rm_hosts:
    - http://rm1:8088
    - http://rm2:8088
http:
  verify_tls: true
  retry_attempts: 5
"#,
        )
        .unwrap();

        assert_eq!(config.cm.options.api_version, 48);
        assert_eq!(config.cm.options.cluster_name, "prod");
        assert_eq!(config.cm.auth.username, "admin");
        assert_eq!(config.yarn_hosts().unwrap().len(), 2);
        assert!(config.http.verify_tls);
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert_eq!(config.http.retry_delay_secs, 5);
        assert_eq!(config.hue.username, "hue");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(!config.http.verify_tls);
        assert_eq!(config.http.fan_out, 4);
        assert_eq!(config.cm.options.api_version, 41);
        assert!(config.cm.auth.is_empty());
        assert!(config.http.authorization.is_none());
    }

    #[test]
    fn authorization_attaches_credential_provider() {
        let config = Config::parse(
            r#"
http:
  authorization: "Negotiate YIIC"
"#,
        )
        .unwrap();
        assert_eq!(config.http.authorization.as_deref(), Some("Negotiate YIIC"));
        let transport = format!("{:?}", config.transport().unwrap());
        assert!(transport.contains("provider: true"));

        let plain = format!("{:?}", Config::default().transport().unwrap());
        assert!(plain.contains("provider: false"));
    }

    #[test]
    fn missing_hosts_are_reported_by_key() {
        let config = Config::default();
        let err = config.namenode_hosts().unwrap_err().to_string();
        assert!(err.contains("hdfs.namenode_hosts"));
        let err = config.cm_hosts().unwrap_err().to_string();
        assert!(err.contains("cm.host"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
