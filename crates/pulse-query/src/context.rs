use crate::filter::FilterPredicate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

/// Short-lived memory of the last applied filter for one conversation,
/// keyed by the caller's conversation id. Lets a follow-up like "and
/// what about iOS?" refine the previous question instead of starting
/// over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_filter: Option<FilterPredicate>,
    pub last_result_summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Keyed store of conversation contexts. The only mutable state in the
/// engine; safe for concurrent `get`/`update` across conversations.
/// Updates are last-write-wins (merge logic lives in the compiler), and
/// expiry is checked lazily on `get` against a caller-supplied TTL — no
/// background sweeping.
#[derive(Debug, Default)]
pub struct ContextStore {
    inner: Mutex<HashMap<String, ConversationContext>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, key: &str, filter: Option<FilterPredicate>, summary: &str) {
        self.update_at(key, filter, summary, OffsetDateTime::now_utc());
    }

    pub fn get(&self, key: &str, ttl: Duration) -> Option<ConversationContext> {
        self.get_at(key, ttl, OffsetDateTime::now_utc())
    }

    /// Seed a context wholesale, e.g. one restored from disk between
    /// invocations of a short-lived process.
    pub fn restore(&self, context: ConversationContext) {
        let mut map = self.inner.lock().expect("context store lock poisoned");
        map.insert(context.conversation_id.clone(), context);
    }

    pub(crate) fn update_at(
        &self,
        key: &str,
        filter: Option<FilterPredicate>,
        summary: &str,
        now: OffsetDateTime,
    ) {
        let mut map = self.inner.lock().expect("context store lock poisoned");
        map.insert(
            key.to_string(),
            ConversationContext {
                conversation_id: key.to_string(),
                last_filter: filter,
                last_result_summary: summary.to_string(),
                updated_at: now,
            },
        );
    }

    pub(crate) fn get_at(
        &self,
        key: &str,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Option<ConversationContext> {
        let mut map = self.inner.lock().expect("context store lock poisoned");
        let expired = match map.get(key) {
            Some(ctx) => now - ctx.updated_at > ttl,
            None => return None,
        };
        if expired {
            map.remove(key);
            return None;
        }
        map.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Field, FilterPredicate};
    use time::macros::datetime;

    #[test]
    fn get_returns_none_for_unknown_key() {
        let store = ContextStore::new();
        assert_eq!(store.get("nobody", Duration::hours(1)), None);
    }

    #[test]
    fn update_then_get_round_trips() {
        let store = ContextStore::new();
        let filter = FilterPredicate::equals(Field::Team, "Tools Team");
        store.update("conv-1", Some(filter.clone()), "3 changes");
        let ctx = store.get("conv-1", Duration::hours(1)).unwrap();
        assert_eq!(ctx.last_filter, Some(filter));
        assert_eq!(ctx.last_result_summary, "3 changes");
    }

    #[test]
    fn update_is_last_write_wins() {
        let store = ContextStore::new();
        store.update("conv-1", None, "first");
        store.update("conv-1", None, "second");
        let ctx = store.get("conv-1", Duration::hours(1)).unwrap();
        assert_eq!(ctx.last_result_summary, "second");
    }

    #[test]
    fn expired_entry_evicted_lazily_on_get() {
        let store = ContextStore::new();
        let t0 = datetime!(2025-08-05 10:00 UTC);
        store.update_at("conv-1", None, "old", t0);

        let later = t0 + Duration::hours(2);
        assert_eq!(store.get_at("conv-1", Duration::hours(1), later), None);
        // Entry was removed, not just hidden.
        assert_eq!(store.get_at("conv-1", Duration::hours(10), later), None);
    }

    #[test]
    fn entry_within_ttl_survives() {
        let store = ContextStore::new();
        let t0 = datetime!(2025-08-05 10:00 UTC);
        store.update_at("conv-1", None, "fresh", t0);
        let later = t0 + Duration::minutes(30);
        assert!(store.get_at("conv-1", Duration::hours(1), later).is_some());
    }

    #[test]
    fn keys_are_independent() {
        let store = ContextStore::new();
        store.update("a", None, "for a");
        store.update("b", None, "for b");
        assert_eq!(
            store.get("a", Duration::hours(1)).unwrap().last_result_summary,
            "for a"
        );
        assert_eq!(
            store.get("b", Duration::hours(1)).unwrap().last_result_summary,
            "for b"
        );
    }

    #[test]
    fn concurrent_updates_do_not_poison() {
        use std::sync::Arc;
        let store = Arc::new(ContextStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let key = format!("conv-{}", i % 2);
                    store.update(&key, None, "hello");
                    store.get(&key, Duration::hours(1));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(store.get("conv-0", Duration::hours(1)).is_some());
    }
}
