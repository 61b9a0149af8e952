use crate::source::{EventSource, FetchQuery, Page, StoreError};
use pulse_core::RawEvent;
use std::time::Duration;

/// Pacing and retry policy for paging through the external store, which
/// enforces per-call limits and rate limits. The engine core stays
/// pure; this driver is the caller-side boundary.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Records per fetch call.
    pub batch_size: usize,
    /// Fixed delay between consecutive pages.
    pub delay: Duration,
    /// Retries per page on transient failure, with doubling backoff.
    pub max_retries: u32,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 100,
            delay: Duration::from_millis(350),
            max_retries: 3,
        }
    }
}

/// Page through `source` until exhausted, honoring the pacing policy.
/// Transient failures are retried per page; a page that keeps failing
/// surfaces the last error to the caller.
pub fn fetch_all(
    source: &dyn EventSource,
    mut query: FetchQuery,
    policy: &BatchPolicy,
) -> Result<Vec<RawEvent>, StoreError> {
    query.page_size = policy.batch_size;
    query.cursor = None;

    let mut events = Vec::new();
    loop {
        let page = fetch_page_with_retry(source, &query, policy)?;
        tracing::debug!(
            fetched = page.events.len(),
            total = events.len() + page.events.len(),
            "fetched page"
        );
        events.extend(page.events);
        match page.next_cursor {
            Some(cursor) => {
                query.cursor = Some(cursor);
                std::thread::sleep(policy.delay);
            }
            None => return Ok(events),
        }
    }
}

fn fetch_page_with_retry(
    source: &dyn EventSource,
    query: &FetchQuery,
    policy: &BatchPolicy,
) -> Result<Page, StoreError> {
    let mut backoff = policy.delay.max(Duration::from_millis(1));
    let mut attempt = 0;
    loop {
        match source.fetch_page(query) {
            Ok(page) => return Ok(page),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(%err, attempt, "transient store failure, backing off");
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}
