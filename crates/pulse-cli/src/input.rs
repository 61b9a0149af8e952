use anyhow::Context;
use pulse_core::RawEvent;
use pulse_store::{fetch_all, BatchPolicy, FetchQuery, MemorySource};
use std::path::Path;
use time::macros::format_description;
use time::Date;

/// Read a JSON array of raw events from disk into a `MemorySource`.
/// File-fed runs go through the same store seam as a live backend.
pub fn open_source(path: &Path) -> anyhow::Result<MemorySource> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read event log {}", path.display()))?;
    let events: Vec<RawEvent> =
        serde_json::from_str(&content).context("event log must be a JSON array of objects")?;
    Ok(MemorySource::new(events))
}

/// Fetch every event in the date window, paced by the batch policy.
pub fn fetch_window(
    source: &MemorySource,
    after: Option<&str>,
    before: Option<&str>,
    policy: &BatchPolicy,
) -> anyhow::Result<Vec<RawEvent>> {
    let query = FetchQuery::date_range(after, before, policy.batch_size);
    Ok(fetch_all(source, query, policy)?)
}

pub fn parse_date(s: &str) -> anyhow::Result<Date> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid date `{s}`, expected YYYY-MM-DD"))
}
