//! Apache Ranger admin API client.

use cdpm_core::{Credentials, HostList, Page, PageStyle, Request, Result, Transport};
use chrono::NaiveDate;
use futures_util::stream::Stream;
use serde_json::Value;
use tracing::debug;

use crate::client::ResilientClient;
use crate::paginate::PaginatedFetcher;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

/// Filters for the access audit listing.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Ranger service (repository) name.
    pub service: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AuditQuery {
    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("repoName".to_string(), self.service.clone()),
            ("excludeServiceUser".to_string(), "false".to_string()),
            ("sortBy".to_string(), "eventTime".to_string()),
            ("sortType".to_string(), "desc".to_string()),
        ];
        if let Some(date) = self.start_date {
            params.push(("startDate".into(), date.format("%m/%d/%Y").to_string()));
        }
        if let Some(date) = self.end_date {
            params.push(("endDate".into(), date.format("%m/%d/%Y").to_string()));
        }
        params
    }
}

/// Filters for the user listing.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// `0` internal, `1` external.
    pub source: u32,
    /// e.g. `ROLE_USER`, `ROLE_SYS_ADMIN`.
    pub roles: Vec<String>,
}

/// Client for Ranger admin, authenticated with basic auth on every request.
#[derive(Debug)]
pub struct RangerClient<T = ReqwestTransport> {
    client: ResilientClient<T>,
    page_size: Option<u64>,
}

impl<T: Transport> RangerClient<T> {
    pub const AUDIT_PAGE_SIZE: u64 = 10_000;
    pub const POLICY_PAGE_SIZE: u64 = 10_000;
    pub const USER_PAGE_SIZE: u64 = 1_000;

    pub fn new(client: ResilientClient<T>) -> Self {
        Self {
            client,
            page_size: None,
        }
    }

    pub fn connect(transport: T, hosts: HostList, username: &str, password: &str) -> Self {
        let authenticator = SessionAuthenticator::new(Credentials::basic(username, password));
        Self::new(ResilientClient::new(transport, hosts, authenticator))
    }

    /// Override the page size of every listing.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    /// Access audit records, newest first.
    ///
    /// The first page's `totalCount` bounds the listing.
    pub fn access_audit<'a>(
        &'a self,
        query: &'a AuditQuery,
    ) -> impl Stream<Item = Result<Page<Value>>> + 'a {
        let page_size = self.page_size.unwrap_or(Self::AUDIT_PAGE_SIZE);
        debug!(service = %query.service, page_size, "listing access audits");
        self.client.pages(
            PaginatedFetcher::count_bounded(page_size),
            "vXAccessAudits",
            move |page| {
                Request::get("/service/assets/accessAudit")
                    .query_pairs(query.params())
                    .query_pairs(page.params(PageStyle::StartIndex))
            },
        )
    }

    /// Resource policies of one service type, with extra `filters` passed
    /// through as query parameters.
    pub fn policies<'a>(
        &'a self,
        service_type: &'a str,
        filters: &'a [(String, String)],
    ) -> impl Stream<Item = Result<Page<Value>>> + 'a {
        let page_size = self.page_size.unwrap_or(Self::POLICY_PAGE_SIZE);
        self.client.pages(
            PaginatedFetcher::threshold_bounded(page_size),
            "policies",
            move |page| {
                Request::get("/service/plugins/policies")
                    .query("policyType", 0)
                    .query("serviceType", service_type)
                    .query_pairs(filters.iter().cloned())
                    .query_pairs(page.params(PageStyle::StartIndex))
            },
        )
    }

    /// Ranger users.
    pub fn users<'a>(
        &'a self,
        query: &'a UserQuery,
    ) -> impl Stream<Item = Result<Page<Value>>> + 'a {
        let page_size = self.page_size.unwrap_or(Self::USER_PAGE_SIZE);
        self.client.pages(
            PaginatedFetcher::threshold_bounded(page_size),
            "vXUsers",
            move |page| {
                Request::get("/service/xusers/users")
                    .query_pairs(page.params(PageStyle::PageNumber))
                    .query_pairs(query.roles.iter().map(|r| ("userRoleList", r.clone())))
                    .query("userSource", query.source)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_dates_use_ranger_format() {
        let query = AuditQuery {
            service: "cm_hdfs".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 7),
            end_date: None,
        };
        let params = query.params();
        assert!(params.contains(&("startDate".to_string(), "03/07/2024".to_string())));
        assert!(params.contains(&("repoName".to_string(), "cm_hdfs".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "endDate"));
    }
}
