//! Bounded-concurrency execution of independent build units.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Runs `worker` over every item with at most `limit` in flight.
///
/// Items start in order. Whenever one finishes, the next queued item starts,
/// so the number in flight never exceeds `limit` or the number of items left.
/// Results are returned in completion order.
///
/// Fail-fast: after the first error nothing new is started. Workers already
/// running are driven to completion, their results discarded, and the first
/// error is returned. The caller therefore sees the error only once the
/// in-flight workers have finished, not at the moment it happens; by then
/// their scratch directories are gone. A `limit` of zero is treated as one.
pub async fn run_with_concurrency<T, R, E, F, Fut>(
    items: Vec<T>,
    limit: usize,
    mut worker: F,
) -> Result<Vec<R>, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let mut queue = items.into_iter();
    let mut in_flight = FuturesUnordered::new();
    for item in queue.by_ref().take(limit.max(1)) {
        in_flight.push(worker(item));
    }

    let mut results = Vec::new();
    let mut first_err = None;
    while let Some(outcome) = in_flight.next().await {
        match outcome {
            Ok(value) if first_err.is_none() => {
                results.push(value);
                if let Some(item) = queue.next() {
                    in_flight.push(worker(item));
                }
            }
            Ok(_) => {}
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
