//! Cache entry types and the JSON envelope used at the remote edge.
//!
//! The cache is agnostic to value structure: values are held as
//! [`serde_json::Value`] in the memory tier and serialized once, at the
//! boundary, when they cross to the remote tier. Callers go through the
//! generic `get<T>` / `set<T>` methods on the manager and never see the
//! envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use std::time::Duration;

/// A single memory-tier entry: the value, its absolute expiry, and the
/// tags it was written with.
///
/// Entries are never mutated in place - a `set` with the same key fully
/// replaces the old entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at: Instant,
    pub tags: Vec<String>,
}

impl CacheEntry {
    pub fn new(value: Value, ttl: Duration, tags: Vec<String>) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
            tags,
        }
    }

    /// An entry is logically dead once its expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left until expiry, or `None` once the entry is dead.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        if now >= self.expires_at {
            None
        } else {
            Some(self.expires_at - now)
        }
    }

    /// True if this entry carries any of the given tags.
    #[must_use]
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Write options accepted by `set`.
///
/// `stale_while_revalidate_secs` is informational: it declares the intent
/// that is realized by `background_refresh`, it is not enforced by `set`
/// itself.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Time-to-live in seconds (memory expiry and remote native TTL).
    pub ttl_secs: u64,
    pub stale_while_revalidate_secs: Option<u64>,
    /// Labels for group invalidation. Empty by default.
    pub tags: Vec<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            stale_while_revalidate_secs: None,
            tags: Vec::new(),
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub fn ttl(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// What actually gets stored in the remote tier: the value plus its tag
/// set, so a remote hit can repopulate the memory tier with the original
/// tags. TTL is delegated to the store's native expiry and not carried
/// in the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEnvelope {
    pub value: Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RemoteEnvelope {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn entry_is_alive_until_ttl_passes() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(60), vec![]);
        assert!(!entry.is_expired());
        assert!(entry.remaining().unwrap() > Duration::from_secs(59));
    }

    #[tokio::test]
    async fn zero_ttl_entry_is_born_dead() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(0), vec![]);
        assert!(entry.is_expired());
        assert!(entry.remaining().is_none());
    }

    #[tokio::test]
    async fn tag_intersection() {
        let entry = CacheEntry::new(
            json!(1),
            Duration::from_secs(60),
            vec!["products".into(), "news".into()],
        );
        assert!(entry.has_any_tag(&["news".to_string()]));
        assert!(entry.has_any_tag(&["other".to_string(), "products".to_string()]));
        assert!(!entry.has_any_tag(&["categories".to_string()]));
        assert!(!entry.has_any_tag(&[]));
    }

    #[test]
    fn write_options_defaults() {
        let opts = WriteOptions::default();
        assert_eq!(opts.ttl_secs, 300);
        assert!(opts.stale_while_revalidate_secs.is_none());
        assert!(opts.tags.is_empty());
    }

    #[test]
    fn envelope_round_trip_preserves_tags() {
        let envelope = RemoteEnvelope {
            value: json!({"name": "tea", "price": 12.5}),
            tags: vec!["products".into()],
        };
        let raw = envelope.encode().unwrap();
        let back = RemoteEnvelope::decode(&raw).unwrap();
        assert_eq!(back.value, envelope.value);
        assert_eq!(back.tags, envelope.tags);
    }

    #[test]
    fn envelope_tolerates_missing_tags_field() {
        let back = RemoteEnvelope::decode(r#"{"value": 42}"#).unwrap();
        assert_eq!(back.value, json!(42));
        assert!(back.tags.is_empty());
    }
}
