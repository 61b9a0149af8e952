use pulse_core::RawEvent;
use std::sync::Mutex;

/// I/O boundary failures. Nothing in the pure engine raises these; they
/// exist so callers can wrap store access with retry policies.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("record not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Transient failures are worth retrying with backoff; the rest are
    /// not.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// One page of raw events from the external store.
#[derive(Debug, Default)]
pub struct Page {
    pub events: Vec<RawEvent>,
    pub next_cursor: Option<usize>,
}

/// Date-bounded, paginated fetch shape, mirroring what the external
/// document store can filter on. Bounds are ISO 8601 prefixes compared
/// lexically against the event's `date` field, both inclusive.
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    pub after: Option<String>,
    pub before: Option<String>,
    pub page_size: usize,
    pub cursor: Option<usize>,
}

impl FetchQuery {
    pub fn date_range(after: Option<&str>, before: Option<&str>, page_size: usize) -> FetchQuery {
        FetchQuery {
            after: after.map(str::to_string),
            before: before.map(str::to_string),
            page_size,
            cursor: None,
        }
    }
}

/// The engine's only view of the external event store: filtered
/// paginated reads plus archival keyed by record identifier.
pub trait EventSource {
    fn fetch_page(&self, query: &FetchQuery) -> Result<Page, StoreError>;
    fn archive(&self, record_id: &str) -> Result<(), StoreError>;
}

/// In-memory source backing tests and file-fed CLI runs. Archival
/// removes the event, like the real store's archive operation does from
/// the caller's perspective.
#[derive(Debug, Default)]
pub struct MemorySource {
    events: Mutex<Vec<RawEvent>>,
}

impl MemorySource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("memory source lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn in_range(event: &RawEvent, query: &FetchQuery) -> bool {
    let date = event.get("date").and_then(|v| v.as_str()).unwrap_or("");
    if let Some(after) = &query.after {
        if date < after.as_str() {
            return false;
        }
    }
    if let Some(before) = &query.before {
        // Prefix match keeps a bare `2025-08-31` bound inclusive of
        // timestamps within that day.
        if date > before.as_str() && !date.starts_with(before.as_str()) {
            return false;
        }
    }
    true
}

impl EventSource for MemorySource {
    fn fetch_page(&self, query: &FetchQuery) -> Result<Page, StoreError> {
        let events = self.events.lock().expect("memory source lock poisoned");
        let matching: Vec<&RawEvent> = events.iter().filter(|e| in_range(e, query)).collect();

        let start = query.cursor.unwrap_or(0);
        let page_size = if query.page_size == 0 {
            matching.len()
        } else {
            query.page_size
        };
        let end = (start + page_size).min(matching.len());
        let next_cursor = if end < matching.len() { Some(end) } else { None };

        Ok(Page {
            events: matching[start..end].iter().map(|e| (*e).clone()).collect(),
            next_cursor,
        })
    }

    fn archive(&self, record_id: &str) -> Result<(), StoreError> {
        let mut events = self.events.lock().expect("memory source lock poisoned");
        let before = events.len();
        events.retain(|e| e.get("id").and_then(|v| v.as_str()) != Some(record_id));
        if events.len() == before {
            return Err(StoreError::NotFound(record_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str, date: &str) -> RawEvent {
        match json!({
            "id": id,
            "project_name": id,
            "previous_status": "QA",
            "new_status": "LIVE",
            "date": date
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn fetch_filters_by_date_range() {
        let source = MemorySource::new(vec![
            event("a", "2025-05-12T09:00:00Z"),
            event("b", "2025-07-15T09:00:00Z"),
            event("c", "2025-08-05T09:00:00Z"),
        ]);
        let page = source
            .fetch_page(&FetchQuery::date_range(Some("2025-07-01"), None, 0))
            .unwrap();
        assert_eq!(page.events.len(), 2);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn before_bound_is_inclusive_of_its_day() {
        let source = MemorySource::new(vec![event("a", "2025-08-31T23:00:00Z")]);
        let page = source
            .fetch_page(&FetchQuery::date_range(None, Some("2025-08-31"), 0))
            .unwrap();
        assert_eq!(page.events.len(), 1);
    }

    #[test]
    fn pagination_walks_with_cursor() {
        let source = MemorySource::new(vec![
            event("a", "2025-08-01"),
            event("b", "2025-08-02"),
            event("c", "2025-08-03"),
        ]);
        let mut query = FetchQuery {
            page_size: 2,
            ..FetchQuery::default()
        };
        let first = source.fetch_page(&query).unwrap();
        assert_eq!(first.events.len(), 2);
        assert_eq!(first.next_cursor, Some(2));

        query.cursor = first.next_cursor;
        let second = source.fetch_page(&query).unwrap();
        assert_eq!(second.events.len(), 1);
        assert_eq!(second.next_cursor, None);
    }

    #[test]
    fn archive_removes_by_record_id() {
        let source = MemorySource::new(vec![event("a", "2025-08-01"), event("b", "2025-08-02")]);
        source.archive("a").unwrap();
        assert_eq!(source.len(), 1);
        assert!(matches!(
            source.archive("a"),
            Err(StoreError::NotFound(_))
        ));
    }
}
