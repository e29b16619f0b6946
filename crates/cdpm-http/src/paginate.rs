//! Lazy pagination over paged list endpoints.

use std::future::Future;

use async_stream::try_stream;
use cdpm_core::{ApiClient, Page, PageRequest, PaginationCursor, Request, Result, Termination};
use futures_util::stream::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Drives one paged listing to completion.
///
/// The fetcher is consumed by [`pages`](Self::pages); listing again means
/// building a new fetcher, which starts from its configured index.
///
/// # Example
///
/// ```no_run
/// # use cdpm_core::{Page, PageRequest};
/// # use cdpm_http::PaginatedFetcher;
/// # use futures_util::StreamExt;
/// # async fn fetch(req: PageRequest) -> cdpm_core::Result<Page<u32>> { unimplemented!() }
/// # async fn example() -> cdpm_core::Result<()> {
/// let pages = PaginatedFetcher::count_bounded(1000).pages(fetch);
/// futures_util::pin_mut!(pages);
/// while let Some(page) = pages.next().await {
///     println!("{} items", page?.items.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PaginatedFetcher {
    cursor: PaginationCursor,
}

impl PaginatedFetcher {
    pub fn new(termination: Termination, start_index: u64, page_size: u64) -> Self {
        Self {
            cursor: PaginationCursor::new(termination, start_index, page_size),
        }
    }

    /// Stop once the first page's `totalCount` items were read.
    pub fn count_bounded(page_size: u64) -> Self {
        Self::new(Termination::CountBounded, 0, page_size)
    }

    /// Stop at the first short page or once `totalCount` is reached.
    pub fn threshold_bounded(page_size: u64) -> Self {
        Self::new(Termination::ThresholdBounded, 0, page_size)
    }

    /// Start at `start_index` instead of zero.
    pub fn starting_at(self, start_index: u64) -> Self {
        Self::new(self.cursor.termination(), start_index, self.cursor.page_size())
    }

    /// Stream pages, calling `fetch` for each one.
    ///
    /// The first error ends the stream. Pages are not retried here; wrap the
    /// whole listing if it should be.
    pub fn pages<T, F, Fut>(self, mut fetch: F) -> impl Stream<Item = Result<Page<T>>>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let mut cursor = self.cursor;
        try_stream! {
            while let Some(request) = cursor.next_request() {
                debug!(
                    start_index = request.start_index,
                    page_size = request.page_size,
                    "fetching page"
                );
                let page = fetch(request).await?;
                cursor.advance(&page.envelope);
                debug!(
                    result_size = page.envelope.result_size,
                    total = ?cursor.max(),
                    finished = cursor.is_finished(),
                    "page received"
                );
                yield page;
            }
        }
    }

    /// Stream pages of a list endpoint served by `client`.
    ///
    /// `build` turns each [`PageRequest`] into the request to send; items are
    /// read from the array under `items_key`.
    pub fn list<'a, C, I, F>(
        self,
        client: &'a C,
        items_key: &'a str,
        mut build: F,
    ) -> impl Stream<Item = Result<Page<I>>> + 'a
    where
        C: ApiClient,
        I: DeserializeOwned + Send + 'a,
        F: FnMut(PageRequest) -> Request + 'a,
    {
        self.pages(move |page| client.page(build(page), items_key))
    }

    /// Stream individual items across all pages.
    pub fn items<T, F, Fut>(self, fetch: F) -> impl Stream<Item = Result<T>>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let pages = self.pages(fetch);
        try_stream! {
            futures_util::pin_mut!(pages);
            while let Some(page) = pages.next().await {
                for item in page?.items {
                    yield item;
                }
            }
        }
    }
}
