//! HUE query processor client.

use cdpm_core::{HostList, Page, PageEnvelope, Request, Result, Transport};
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::client::ResilientClient;
use crate::fanout::fan_out;
use crate::paginate::PaginatedFetcher;
use crate::session::SessionAuthenticator;
use crate::transport::ReqwestTransport;

const DO_AS_HEADER: &str = "x-do-as";

/// A query history search window, in epoch milliseconds.
#[derive(Debug, Clone, Default)]
pub struct QuerySearch {
    pub start_time: i64,
    pub end_time: i64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    queries: Vec<Value>,
    #[serde(default)]
    meta: SearchMeta,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMeta {
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Client for the HUE query processor, acting on behalf of one user.
#[derive(Debug)]
pub struct HueQpClient<T = ReqwestTransport> {
    client: ResilientClient<T>,
    do_as: String,
    page_size: u64,
}

impl<T: Transport> HueQpClient<T> {
    pub const DEFAULT_PAGE_SIZE: u64 = 100;

    pub fn new(client: ResilientClient<T>, do_as: impl Into<String>) -> Self {
        Self {
            client,
            do_as: do_as.into(),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn connect(transport: T, hosts: HostList, do_as: impl Into<String>) -> Self {
        Self::new(
            ResilientClient::new(transport, hosts, SessionAuthenticator::anonymous()),
            do_as,
        )
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    /// Search the query history, newest first.
    ///
    /// The server reports no usable total, so the listing ends at the first
    /// short or empty page.
    pub fn search<'a>(
        &'a self,
        search: &'a QuerySearch,
    ) -> impl Stream<Item = Result<Page<Value>>> + 'a {
        PaginatedFetcher::threshold_bounded(self.page_size).pages(move |page| async move {
            let body = json!({
                "search": {
                    "endTime": search.end_time,
                    "limit": page.page_size,
                    "offset": page.start_index,
                    "facets": [],
                    "text": search.text,
                    "sortText": "startTime:DESC",
                    "startTime": search.start_time,
                    "type": "BASIC",
                }
            });
            let request = Request::post("/api/query/search")
                .header(DO_AS_HEADER, self.do_as.as_str())
                .json(&body)?;
            let result: SearchResult = self.client.execute_json(request).await?;
            let envelope = PageEnvelope {
                start_index: result.meta.offset.unwrap_or(page.start_index),
                page_size: result.meta.limit.unwrap_or(page.page_size),
                total_count: None,
                result_size: result.queries.len() as u64,
            };
            Ok::<_, cdpm_core::Error>(Page::new(envelope, result.queries))
        })
    }

    /// Extended details of one query.
    #[instrument(skip(self))]
    pub async fn query_detail(&self, query_id: &str) -> Result<Value> {
        let request = Request::get("/api/hive/query")
            .query("queryId", query_id)
            .query("extended", "true")
            .header(DO_AS_HEADER, self.do_as.as_str());
        self.client.execute_json(request).await
    }

    /// Details of several queries, at most `limit` in flight, in completion
    /// order.
    pub fn query_details(
        &self,
        query_ids: Vec<String>,
        limit: usize,
    ) -> impl Stream<Item = (String, Result<Value>)> + '_ {
        fan_out(query_ids, limit, move |id| async move {
            let detail = self.query_detail(&id).await;
            (id, detail)
        })
    }
}
