//! Page envelopes and the pagination cursor.
//!
//! List endpoints answer with an envelope of `startIndex`, `pageSize`,
//! `totalCount` and `resultSize` next to the items. The cursor derives the
//! next request from those fields; it never stores the position separately
//! from what the server reported.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::Result;
use crate::error::InvalidInputError;

/// Paging fields of one list response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    #[serde(default)]
    pub start_index: u64,
    /// Page size as applied by the server, which may clamp the request.
    #[serde(default)]
    pub page_size: u64,
    /// `None` while the total is unknown (reported as a negative number).
    #[serde(default, deserialize_with = "total_count")]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub result_size: u64,
}

fn total_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|n| u64::try_from(n).ok()))
}

/// One page of items with its envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub envelope: PageEnvelope,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page. A missing `resultSize` is taken from the item count.
    pub fn new(mut envelope: PageEnvelope, items: Vec<T>) -> Self {
        if envelope.result_size == 0 {
            envelope.result_size = items.len() as u64;
        }
        Self { envelope, items }
    }

    /// Build a page for endpoints that do not echo an envelope.
    pub fn from_items(request: PageRequest, total_count: Option<u64>, items: Vec<T>) -> Self {
        let envelope = PageEnvelope {
            start_index: request.start_index,
            page_size: request.page_size,
            total_count,
            result_size: items.len() as u64,
        };
        Self { envelope, items }
    }
}

/// Decode a list response whose envelope fields sit next to an item array
/// under `items_key`.
///
/// A missing or `null` item array is an empty page.
pub fn decode_page<T: DeserializeOwned>(value: Value, items_key: &str) -> Result<Page<T>> {
    let Value::Object(mut object) = value else {
        return Err(InvalidInputError::Other {
            message: "page response is not a JSON object".into(),
        }
        .into());
    };
    let items = match object.remove(items_key) {
        None | Some(Value::Null) => Vec::new(),
        Some(items) => serde_json::from_value(items)?,
    };
    let envelope = PageEnvelope::deserialize(Value::Object(object))?;
    Ok(Page::new(envelope, items))
}

/// Position and size of a page to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start_index: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Zero-based page number for page-numbered endpoints.
    pub fn page_number(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.start_index / self.page_size
        }
    }

    /// Render as query parameters in the given style.
    pub fn params(&self, style: PageStyle) -> Vec<(&'static str, String)> {
        match style {
            PageStyle::StartIndex => vec![
                ("startIndex", self.start_index.to_string()),
                ("pageSize", self.page_size.to_string()),
            ],
            PageStyle::OffsetLimit => vec![
                ("offset", self.start_index.to_string()),
                ("limit", self.page_size.to_string()),
            ],
            PageStyle::PageNumber => vec![
                ("page", self.page_number().to_string()),
                ("startIndex", self.start_index.to_string()),
                ("pageSize", self.page_size.to_string()),
            ],
        }
    }
}

/// Naming of the paging query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    /// `startIndex` / `pageSize`.
    StartIndex,
    /// `offset` / `limit`.
    OffsetLimit,
    /// `page` plus `startIndex` / `pageSize`.
    PageNumber,
}

/// When a paged listing is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Trust the `totalCount` of the first page and stop once that many
    /// items were read.
    CountBounded,
    /// Stop at the first short page, or once `startIndex + resultSize`
    /// reaches a known `totalCount`.
    ThresholdBounded,
}

/// Pagination state for one listing.
///
/// Feed every received envelope to [`PaginationCursor::advance`] and ask
/// [`PaginationCursor::next_request`] for the next page until it returns
/// `None`. A page with no items always ends the listing.
#[derive(Debug, Clone)]
pub struct PaginationCursor {
    termination: Termination,
    page_size: u64,
    index: u64,
    max: Option<u64>,
    finished: bool,
}

impl PaginationCursor {
    pub fn new(termination: Termination, start_index: u64, page_size: u64) -> Self {
        Self {
            termination,
            page_size,
            index: start_index,
            max: None,
            finished: false,
        }
    }

    /// The next page to fetch, or `None` once the listing is exhausted.
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.finished {
            return None;
        }
        Some(PageRequest {
            start_index: self.index,
            page_size: self.page_size,
        })
    }

    /// Record a received page.
    pub fn advance(&mut self, envelope: &PageEnvelope) {
        if self.max.is_none() {
            self.max = envelope.total_count;
        }
        let page_size = if envelope.page_size > 0 {
            envelope.page_size
        } else {
            self.page_size
        };
        let full_page = envelope.result_size >= page_size;

        match self.termination {
            Termination::CountBounded => {
                self.index += envelope.result_size;
                self.finished = match self.max {
                    Some(max) => self.index >= max,
                    // Total never reported; fall back to the short-page rule.
                    None => !full_page,
                };
            }
            Termination::ThresholdBounded => {
                let next = envelope.start_index + envelope.result_size;
                let progressed = next > self.index;
                self.index = next;
                let below_max = self.max.is_none_or(|max| self.index < max);
                self.finished = !(full_page && below_max && progressed);
            }
        }

        if envelope.result_size == 0 {
            self.finished = true;
        }
    }

    /// Index of the next item to request.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Total item count, once known.
    pub fn max(&self) -> Option<u64> {
        self.max
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Page size sent with each request.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(start: u64, size: u64, total: Option<u64>, result: u64) -> PageEnvelope {
        PageEnvelope {
            start_index: start,
            page_size: size,
            total_count: total,
            result_size: result,
        }
    }

    #[test]
    fn envelope_treats_negative_total_as_unknown() {
        let env: PageEnvelope = serde_json::from_str(
            r#"{"startIndex":0,"pageSize":100,"totalCount":-1,"resultSize":100}"#,
        )
        .unwrap();
        assert_eq!(env.total_count, None);
        assert_eq!(env.page_size, 100);

        let env: PageEnvelope = serde_json::from_str(r#"{"totalCount":25}"#).unwrap();
        assert_eq!(env.total_count, Some(25));
        assert_eq!(env.result_size, 0);
    }

    #[test]
    fn count_bounded_stops_at_total_without_extra_call() {
        let mut cursor = PaginationCursor::new(Termination::CountBounded, 0, 10);
        let mut requested = Vec::new();
        let sizes = [10, 10, 5];
        for size in sizes {
            let req = cursor.next_request().unwrap();
            requested.push(req.start_index);
            cursor.advance(&envelope(req.start_index, 10, Some(25), size));
        }
        assert_eq!(requested, vec![0, 10, 20]);
        assert!(cursor.next_request().is_none());
        assert_eq!(cursor.index(), 25);
    }

    #[test]
    fn count_bounded_keeps_first_total() {
        let mut cursor = PaginationCursor::new(Termination::CountBounded, 0, 10);
        cursor.advance(&envelope(0, 10, Some(20), 10));
        // Later pages may report a different total; the first one is kept.
        cursor.advance(&envelope(10, 10, Some(1000), 10));
        assert_eq!(cursor.max(), Some(20));
        assert!(cursor.is_finished());
    }

    #[test]
    fn threshold_stops_on_short_page_regardless_of_total() {
        let mut cursor = PaginationCursor::new(Termination::ThresholdBounded, 0, 10);
        cursor.advance(&envelope(0, 10, Some(1000), 7));
        assert!(cursor.next_request().is_none());
    }

    #[test]
    fn threshold_stops_when_total_reached() {
        let mut cursor = PaginationCursor::new(Termination::ThresholdBounded, 0, 10);
        cursor.advance(&envelope(0, 10, Some(20), 10));
        assert_eq!(cursor.next_request().unwrap().start_index, 10);
        cursor.advance(&envelope(10, 10, Some(20), 10));
        assert!(cursor.next_request().is_none());
    }

    #[test]
    fn threshold_probes_when_total_unknown() {
        let mut cursor = PaginationCursor::new(Termination::ThresholdBounded, 0, 10);
        cursor.advance(&envelope(0, 10, None, 10));
        assert_eq!(cursor.max(), None);
        assert_eq!(cursor.next_request().unwrap().start_index, 10);
        cursor.advance(&envelope(10, 10, Some(30), 10));
        assert_eq!(cursor.max(), Some(30));
        assert_eq!(cursor.next_request().unwrap().start_index, 20);
    }

    #[test]
    fn server_clamped_page_size_is_honoured() {
        // Asked for 10000, server caps at 1000.
        let mut cursor = PaginationCursor::new(Termination::ThresholdBounded, 0, 10_000);
        cursor.advance(&envelope(0, 1000, Some(2500), 1000));
        let next = cursor.next_request().unwrap();
        assert_eq!(next.start_index, 1000);
        assert_eq!(next.page_size, 10_000);
    }

    #[test]
    fn empty_page_always_terminates() {
        let mut cursor = PaginationCursor::new(Termination::CountBounded, 0, 10);
        cursor.advance(&envelope(0, 10, Some(50), 0));
        assert!(cursor.is_finished());
    }

    #[test]
    fn page_styles_render_expected_params() {
        let req = PageRequest {
            start_index: 2000,
            page_size: 1000,
        };
        assert_eq!(
            req.params(PageStyle::OffsetLimit),
            vec![("offset", "2000".to_string()), ("limit", "1000".to_string())]
        );
        assert_eq!(req.params(PageStyle::PageNumber)[0], ("page", "2".to_string()));
        assert_eq!(req.params(PageStyle::StartIndex)[0].0, "startIndex");
    }

    #[test]
    fn page_fills_missing_result_size() {
        let page = Page::new(envelope(0, 10, None, 0), vec![1, 2, 3]);
        assert_eq!(page.envelope.result_size, 3);
    }

    #[test]
    fn decode_page_splits_envelope_and_items() {
        let value = serde_json::json!({
            "startIndex": 0,
            "pageSize": 2,
            "totalCount": 3,
            "resultSize": 2,
            "vXUsers": [{"name": "a"}, {"name": "b"}]
        });
        let page: Page<Value> = decode_page(value, "vXUsers").unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.envelope.total_count, Some(3));

        let empty: Page<Value> =
            decode_page(serde_json::json!({"totalCount": 0}), "policies").unwrap();
        assert!(empty.items.is_empty());
        assert!(decode_page::<Value>(serde_json::json!([1, 2]), "x").is_err());
    }
}
