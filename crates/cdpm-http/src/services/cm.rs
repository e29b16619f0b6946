//! Cloudera Manager API client.

use std::fmt;
use std::str::FromStr;

use cdpm_core::error::InvalidInputError;
use cdpm_core::{Credentials, HostList, Request, Result, Transport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use crate::client::ResilientClient;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

/// Cheap endpoint used to obtain and validate the `SESSION` cookie.
pub const CM_PROBE_PATH: &str = "/api/v1/clusters";

/// Deployment-specific paths and names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmOptions {
    pub api_version: u32,
    pub cluster_name: String,
    /// UI path of the HDFS balancer command page, e.g.
    /// `/cmf/services/12/instances/34/commands/Rebalance`.
    pub rebalance_path: String,
    /// Role name of the HDFS balancer.
    pub rebalance_role: String,
    /// UI path of the HDFS file browser CSV export.
    pub file_browser_path: String,
}

impl Default for CmOptions {
    fn default() -> Self {
        Self {
            api_version: 41,
            cluster_name: "cluster".into(),
            rebalance_path: String::new(),
            rebalance_role: String::new(),
            file_browser_path: String::new(),
        }
    }
}

/// A Cloudera Manager command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommand {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Response of `/cmf/healthIssues.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthIssues {
    #[serde(default)]
    pub unhealthy_checks: Vec<Value>,
    #[serde(default)]
    pub unhealthy_entities: Vec<Value>,
}

/// Granularity of time-series data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricRollup {
    Raw,
    TenMinutely,
    Hourly,
    SixHourly,
    Daily,
    Weekly,
}

impl MetricRollup {
    pub const ALL: [MetricRollup; 6] = [
        MetricRollup::Raw,
        MetricRollup::TenMinutely,
        MetricRollup::Hourly,
        MetricRollup::SixHourly,
        MetricRollup::Daily,
        MetricRollup::Weekly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricRollup::Raw => "RAW",
            MetricRollup::TenMinutely => "TEN_MINUTELY",
            MetricRollup::Hourly => "HOURLY",
            MetricRollup::SixHourly => "SIX_HOURLY",
            MetricRollup::Daily => "DAILY",
            MetricRollup::Weekly => "WEEKLY",
        }
    }
}

impl fmt::Display for MetricRollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricRollup {
    type Err = InvalidInputError;

    /// Case-insensitive.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidInputError::Other {
                message: format!("unknown rollup '{}'", s),
            })
    }
}

/// Response format for time-series queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricContentType {
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "text/csv")]
    Csv,
}

/// A tsquery request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<MetricContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_rollup: Option<MetricRollup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_use_desired_rollup: Option<bool>,
}

impl TimeSeriesQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from.to_rfc3339());
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to.to_rfc3339());
        self
    }

    pub fn content_type(mut self, content_type: MetricContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Ask for a rollup; `force` makes the server refuse other granularities.
    pub fn rollup(mut self, rollup: MetricRollup, force: Option<bool>) -> Self {
        self.desired_rollup = Some(rollup);
        self.must_use_desired_rollup = force;
        self
    }
}

/// One queue of the YARN Queue Manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YarnQueue {
    pub name: String,
    /// Dotted path, e.g. `root.default`.
    pub queue_path: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub properties: QueueProperties,
    /// Capacities and effective resources, passed through as returned.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueProperties {
    #[serde(rename = "queueAcls.SUBMIT_APP", default)]
    pub acl_submit: String,
    #[serde(rename = "queueAcls.ADMINISTER_QUEUE", default)]
    pub acl_administer: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Queues {
    #[serde(default)]
    queues: Vec<YarnQueue>,
}

/// One edit of a queue ACL list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclChange {
    Add(String),
    Remove(String),
}

impl FromStr for AclChange {
    type Err = InvalidInputError;

    /// `+name` adds, `-name` removes; a bare name adds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, remove) = match s.strip_prefix('-') {
            Some(name) => (name, true),
            None => (s.strip_prefix('+').unwrap_or(s), false),
        };
        if name.is_empty() {
            return Err(InvalidInputError::Other {
                message: format!("empty ACL entry '{}'", s),
            });
        }
        Ok(if remove {
            AclChange::Remove(name.to_string())
        } else {
            AclChange::Add(name.to_string())
        })
    }
}

/// A YARN queue ACL: users and groups, written as `u1,u2 g1,g2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueAcl {
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

impl QueueAcl {
    pub fn parse(acl: &str) -> Self {
        let (users, groups) = acl.split_once(' ').unwrap_or((acl, ""));
        let names = |list: &str| {
            list.split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect()
        };
        Self {
            users: names(users),
            groups: names(groups),
        }
    }

    /// Apply edits in order. Adding a present name or removing an absent
    /// one changes nothing.
    pub fn apply(&mut self, users: &[AclChange], groups: &[AclChange]) {
        merge_acl(&mut self.users, users);
        merge_acl(&mut self.groups, groups);
    }
}

fn merge_acl(names: &mut Vec<String>, changes: &[AclChange]) {
    for change in changes {
        match change {
            AclChange::Add(name) if !names.contains(name) => names.push(name.clone()),
            AclChange::Remove(name) => names.retain(|n| n != name),
            AclChange::Add(_) => {}
        }
    }
}

impl fmt::Display for QueueAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.users.join(","), self.groups.join(","))
    }
}

/// Client for the Cloudera Manager REST API and a few of its UI endpoints.
///
/// Authenticates with a `SESSION` cookie obtained from [`CM_PROBE_PATH`].
#[derive(Debug)]
pub struct CmClient<T = ReqwestTransport> {
    client: ResilientClient<T>,
    options: CmOptions,
}

impl<T: Transport> CmClient<T> {
    pub fn new(client: ResilientClient<T>, options: CmOptions) -> Self {
        Self { client, options }
    }

    /// Build a client whose session is renewed with `credentials`.
    pub fn connect(
        transport: T,
        hosts: HostList,
        credentials: Credentials,
        options: CmOptions,
    ) -> Self {
        let authenticator = SessionAuthenticator::new(credentials).with_probe(CM_PROBE_PATH);
        Self::new(ResilientClient::new(transport, hosts, authenticator), options)
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    pub fn options(&self) -> &CmOptions {
        &self.options
    }

    fn api(&self, path: &str) -> String {
        format!("/api/v{}/{}", self.options.api_version, path)
    }

    fn queue_manager(&self, path: &str) -> String {
        let cluster = &self.options.cluster_name;
        format!(
            "/cmf/clusters/{cluster}/queue-manager-api/api/v1/environments/dev/clusters/{cluster}\
             /resources/scheduler/partitions/default/queues{path}"
        )
    }

    async fn queue_manager_referer(&self) -> String {
        let page = format!("cmf/clusters/{}/queue-manager/", self.options.cluster_name);
        self.client.hosts().await.primary().join(&page)
    }

    pub async fn clusters(&self) -> Result<Vec<Value>> {
        let request = Request::get(self.api("clusters"));
        let list: Items<Value> = self.client.execute_json(request).await?;
        Ok(list.items)
    }

    #[instrument(skip(self))]
    pub async fn hosts(&self) -> Result<Vec<Value>> {
        let request = Request::get(self.api("hosts")).query("view", "FULL");
        let list: Items<Value> = self.client.execute_json(request).await?;
        debug!(count = list.items.len(), "fetched hosts");
        Ok(list.items)
    }

    pub async fn command(&self, id: u64) -> Result<ApiCommand> {
        self.client
            .execute_json(Request::get(self.api(&format!("commands/{}", id))))
            .await
    }

    pub async fn health_issues(&self) -> Result<HealthIssues> {
        self.client
            .execute_json(Request::get("/cmf/healthIssues.json"))
            .await
    }

    pub async fn auth_roles(&self) -> Result<Vec<Value>> {
        let request = Request::get(self.api("authRoles")).query("view", "FULL");
        let list: Items<Value> = self.client.execute_json(request).await?;
        Ok(list.items)
    }

    /// Raw time-series response, JSON or CSV depending on the query.
    #[instrument(skip(self, query), fields(query = %query.query))]
    pub async fn timeseries(&self, query: &TimeSeriesQuery) -> Result<String> {
        debug!(?query, "sending time-series query");
        let request = Request::post(self.api("timeseries")).json(query)?;
        Ok(self.client.execute(request).await?.text())
    }

    /// Time-series data decoded as JSON.
    pub async fn timedata(&self, query: &TimeSeriesQuery) -> Result<Value> {
        let request = Request::post(self.api("timeseries")).json(query)?;
        self.client.execute_json(request).await
    }

    /// Start the HDFS balancer and return its command.
    ///
    /// Submits the balancer form of the CM UI, then looks the command up
    /// among the balancer role's commands.
    #[instrument(skip(self))]
    pub async fn rebalance_start(&self) -> Result<ApiCommand> {
        let referer = format!("{}/", self.client.hosts().await.primary().join(""));
        let form_path = format!("{}/do", self.options.rebalance_path.trim_end_matches('/'));
        let submit = Request::post(form_path)
            .header("Referer", referer)
            .form("confirm=on&command=Rebalance");
        self.client.execute(submit).await?;

        let path = self.api(&format!(
            "clusters/{}/services/hdfs/roles/{}/commands",
            self.options.cluster_name, self.options.rebalance_role
        ));
        let commands: Items<ApiCommand> = self.client.execute_json(Request::get(path)).await?;
        let command = commands
            .items
            .into_iter()
            .find(|c| c.name == "Rebalance")
            .ok_or_else(|| InvalidInputError::Other {
                message: "no Rebalance command found on the balancer role".into(),
            })?;
        info!(id = command.id, active = command.active, "rebalance started");
        Ok(command)
    }

    /// Abort a command.
    #[instrument(skip(self))]
    pub async fn rebalance_stop(&self, id: u64) -> Result<ApiCommand> {
        let command: ApiCommand = self
            .client
            .execute_json(Request::post(self.api(&format!("commands/{}/abort", id))))
            .await?;
        info!(id, "rebalance aborted");
        Ok(command)
    }

    /// Queues of the default scheduler partition.
    #[instrument(skip(self))]
    pub async fn queue_config(&self) -> Result<Vec<YarnQueue>> {
        let request = Request::get(self.queue_manager(""))
            .header("Accept", "application/json, text/plain, */*")
            .header("Referer", self.queue_manager_referer().await);
        let config: Queues = self.client.execute_json(request).await?;
        debug!(count = config.queues.len(), "fetched queue config");
        Ok(config.queues)
    }

    /// Edit the submit and administer ACLs of the queue at `queue_path`.
    ///
    /// Both ACLs are set to the submit ACL with `users` and `groups`
    /// applied. Returns the new ACL, or `None` when nothing changed and no
    /// update was sent.
    #[instrument(skip(self, users, groups))]
    pub async fn update_queue_acls(
        &self,
        queue_path: &str,
        users: &[AclChange],
        groups: &[AclChange],
    ) -> Result<Option<QueueAcl>> {
        let queue = self
            .queue_config()
            .await?
            .into_iter()
            .find(|q| q.queue_path == queue_path)
            .ok_or_else(|| InvalidInputError::Other {
                message: format!("no queue '{}' in the queue manager", queue_path),
            })?;
        let current = QueueAcl::parse(&queue.properties.acl_submit);
        let mut acl = current.clone();
        acl.apply(users, groups);
        if acl == current {
            info!("queue ACLs unchanged");
            return Ok(None);
        }

        let value = acl.to_string();
        info!(acl = %value, "setting queue ACLs");
        let payload = json!({
            "properties": [
                {"name": "acl_submit_applications", "value": value},
                {"name": "acl_administer_queue", "value": value},
            ],
            "message": format!("Changed properties of {} by automation", queue_path),
        });
        let request = Request::put(self.queue_manager(&format!("/{}", queue_path)))
            .header("Accept", "application/json, text/plain, */*")
            .header("Referer", self.queue_manager_referer().await)
            .json(&payload)?;
        self.client.execute(request).await?;
        Ok(Some(acl))
    }

    /// CSV listing of `path` from the file browser.
    ///
    /// Retried with the client's retry policy, since the export is slow and
    /// connections to it are often dropped.
    #[instrument(skip(self))]
    pub async fn file_browser(&self, path: &str) -> Result<String> {
        let terms = json!({
            "terms": [{"fileSearchType": 12, "queryText": path, "negated": false}]
        });
        let request = Request::get(self.options.file_browser_path.clone()).query_pairs([
            ("limit", "0".to_string()),
            ("offset", "0".to_string()),
            ("format", "CSV".to_string()),
            ("path", path.to_string()),
            ("json", terms.to_string()),
            ("sortBy", "FILENAME".to_string()),
            ("sortReverse", "false".to_string()),
        ]);
        Ok(self.client.execute_with_retry(request).await?.text())
    }
}
