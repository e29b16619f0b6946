//! Bounded concurrent fan-out.

use std::future::Future;

use futures_util::stream::{self, Stream, StreamExt};

/// In-flight limit used for per-item detail fetches.
pub const DEFAULT_FAN_OUT: usize = 4;

/// Run `operation` for every item with at most `limit` running at once.
///
/// Results arrive in completion order, not input order.
pub fn fan_out<I, F, Fut>(items: I, limit: usize, operation: F) -> impl Stream<Item = Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items).map(operation).buffer_unordered(limit.max(1))
}
