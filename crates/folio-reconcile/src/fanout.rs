//! Bounded fan-out

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `op` over `items` with at most `limit` futures in flight
///
/// Completion order is arbitrary; results come back in input order. `op`
/// receives each item's input index.
pub async fn join_indexed<I, T, R, F, Fut>(items: I, limit: usize, op: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut results: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let fut = op(index, item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, r)| r).collect()
}
