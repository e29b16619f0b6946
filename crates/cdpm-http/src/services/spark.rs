//! Spark History Server client.

use std::fmt;
use std::str::FromStr;

use cdpm_core::error::InvalidInputError;
use cdpm_core::{Error, HostList, Request, Result, Transport};
use chrono::{DateTime, Utc};
use futures_util::stream::Stream;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::ResilientClient;
use crate::fanout::fan_out;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

/// Application state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Completed,
    Running,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Completed => "completed",
            AppStatus::Running => "running",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppStatus {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "completed" => Ok(AppStatus::Completed),
            "running" => Ok(AppStatus::Running),
            other => Err(InvalidInputError::Other {
                message: format!("unknown application status '{}'", other),
            }),
        }
    }
}

/// Filters for `/api/v1/applications`.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<AppStatus>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
    pub min_end_date: Option<DateTime<Utc>>,
    pub max_end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl ApplicationFilter {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        let dates = [
            ("minDate", self.min_date),
            ("maxDate", self.max_date),
            ("minEndDate", self.min_end_date),
            ("maxEndDate", self.max_end_date),
        ];
        for (key, date) in dates {
            if let Some(date) = date {
                params.push((key, history_date(date)));
            }
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Date format accepted by the history server, e.g. `2024-01-31T23:59:59.000GMT`.
fn history_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fGMT").to_string()
}

/// Client for the Spark History Server REST API across instances.
#[derive(Debug)]
pub struct SparkHistoryClient<T = ReqwestTransport> {
    client: ResilientClient<T>,
}

impl<T: Transport> SparkHistoryClient<T> {
    pub fn new(client: ResilientClient<T>) -> Self {
        Self { client }
    }

    pub fn connect(transport: T, history_hosts: HostList) -> Self {
        Self::new(ResilientClient::new(
            transport,
            history_hosts,
            SessionAuthenticator::anonymous(),
        ))
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    #[instrument(skip(self))]
    pub async fn applications(&self, filter: &ApplicationFilter) -> Result<Vec<Value>> {
        let request = Request::get("/api/v1/applications").query_pairs(filter.params());
        let apps: Vec<Value> = self.client.execute_json(request).await?;
        debug!(count = apps.len(), "fetched applications");
        Ok(apps)
    }

    /// Environment of one application, retried on connection failures.
    ///
    /// # Errors
    ///
    /// [`Error::ApplicationNotFound`] when the server answers `404`.
    #[instrument(skip(self))]
    pub async fn environment(&self, app_id: &str) -> Result<Value> {
        let request = Request::get(format!("/api/v1/applications/{}/environment", app_id));
        match self.client.execute_with_retry(request).await {
            Ok(response) => response.json(),
            Err(err) if err.status() == Some(404) => Err(Error::ApplicationNotFound {
                app_id: app_id.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Environments of several applications, at most `limit` in flight.
    ///
    /// Pairs arrive in completion order.
    pub fn environments(
        &self,
        app_ids: Vec<String>,
        limit: usize,
    ) -> impl Stream<Item = (String, Result<Value>)> + '_ {
        fan_out(app_ids, limit, move |app_id| async move {
            let env = self.environment(&app_id).await;
            (app_id, env)
        })
    }
}
