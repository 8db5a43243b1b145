//! Core cache operations: layered read/write, point delete, tag
//! invalidation with pattern fallback, pattern delete, expiry sweep.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{tag_index_key, CacheManager};
use crate::entry::{RemoteEnvelope, WriteOptions};
use crate::metrics::{record_invalidated_keys, record_sweep};

impl CacheManager {
    // ═══════════════════════════════════════════════════════════════════════════
    // Layered read / write
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get the cached value for `key`, or `None` when absent or expired
    /// in both tiers.
    ///
    /// Memory is consulted first (no I/O); a remote hit is promoted back
    /// into memory with a short fixed TTL so hot keys don't round-trip to
    /// the remote store on every read. Internal failures are counted,
    /// logged, and read as a miss - this method never errors.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let started = Instant::now();

        // Memory tier: fast path, no I/O
        if let Some(entry) = self.memory.get_live(key) {
            self.metrics.record_hit();
            self.metrics.record_response_time(started.elapsed());
            return self.decode(key, entry.value);
        }

        // Remote tier: on hit, promote back into memory
        if let Some(remote) = self.remote().await {
            match remote.get(key).await {
                Ok(Some(raw)) => match RemoteEnvelope::decode(&raw) {
                    Ok(envelope) => {
                        self.memory.insert(
                            key,
                            envelope.value.clone(),
                            Duration::from_secs(self.config.promote_ttl_secs),
                            envelope.tags,
                        );
                        self.metrics.record_hit();
                        self.metrics.record_response_time(started.elapsed());
                        return self.decode(key, envelope.value);
                    }
                    Err(e) => {
                        self.metrics.record_error();
                        warn!(key, error = %e, "remote payload failed to decode, treating as miss");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    self.metrics.record_error();
                    warn!(key, error = %e, "remote get failed, treating as miss");
                }
            }
        }

        self.metrics.record_miss();
        self.metrics.record_response_time(started.elapsed());
        None
    }

    /// Write `value` to both tiers and index its tags.
    ///
    /// Memory gets an absolute expiry of `now + ttl`; the remote tier gets
    /// the same TTL natively. For each tag, `key` is added to the remote
    /// tag index with a TTL slightly past the value's own, so the index
    /// never dies before its members. Indexing failures are isolated per
    /// tag and never roll back the value write. Never errors.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, options: WriteOptions) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                self.metrics.record_error();
                warn!(key, error = %e, "value failed to encode, not cached");
                return;
            }
        };

        self.memory.insert(
            key,
            value.clone(),
            Duration::from_secs(options.ttl_secs),
            options.tags.clone(),
        );
        self.metrics.record_set();

        let Some(remote) = self.remote().await else {
            return;
        };

        let envelope = RemoteEnvelope {
            value,
            tags: options.tags.clone(),
        };
        match envelope.encode() {
            Ok(raw) => {
                if let Err(e) = remote.set_ex(key, &raw, options.ttl_secs).await {
                    self.metrics.record_error();
                    warn!(key, error = %e, "remote set failed, entry is memory-only");
                    return;
                }
            }
            Err(e) => {
                self.metrics.record_error();
                warn!(key, error = %e, "envelope failed to encode, entry is memory-only");
                return;
            }
        }

        for tag in &options.tags {
            let index_key = tag_index_key(tag);
            let index_ttl = options.ttl_secs + self.config.tag_index_ttl_margin_secs;
            let result = async {
                remote.sadd(&index_key, key).await?;
                remote.expire(&index_key, index_ttl).await
            }
            .await;
            if let Err(e) = result {
                self.metrics.record_error();
                warn!(key, tag = %tag, error = %e, "tag indexing failed, value write stands");
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Deletion & invalidation
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remove `key` from both tiers. Idempotent; stale tag-index
    /// membership is tolerated (a later tag sweep deleting an
    /// already-gone key is a no-op).
    pub async fn delete(&self, key: &str) {
        self.memory.remove(key);
        self.metrics.record_delete();

        if let Some(remote) = self.remote().await {
            if let Err(e) = remote.del(&[key.to_string()]).await {
                self.metrics.record_error();
                warn!(key, error = %e, "remote delete failed");
            }
        }
    }

    /// Remove every entry carrying any of the given tags, in both tiers.
    /// No-op for an empty tag list.
    ///
    /// Memory is swept by scanning tag sets. The remote tier uses the tag
    /// index: members are bulk-deleted, then the index key itself. When
    /// the index lookup fails, invalidation degrades to a derived
    /// pattern sweep per tag (see [`crate::CacheConfig::patterns_for_tag`]).
    pub async fn invalidate(&self, tags: &[String]) {
        if tags.is_empty() {
            return;
        }

        let removed = self.memory.remove_tagged(tags);
        record_invalidated_keys("memory", removed);
        self.metrics.record_invalidation();
        debug!(?tags, removed, "memory invalidation sweep");

        let Some(remote) = self.remote().await else {
            return;
        };

        for tag in tags {
            let index_key = tag_index_key(tag);
            match remote.smembers(&index_key).await {
                Ok(members) if members.is_empty() => {}
                Ok(members) => {
                    record_invalidated_keys("remote", members.len());
                    // Members first, then the consumed index itself
                    if let Err(e) = remote.del(&members).await {
                        self.metrics.record_error();
                        warn!(tag = %tag, error = %e, "remote invalidation delete failed");
                        continue;
                    }
                    if let Err(e) = remote.del(&[index_key.clone()]).await {
                        self.metrics.record_error();
                        warn!(tag = %tag, error = %e, "tag index cleanup failed");
                    }
                }
                Err(e) => {
                    self.metrics.record_error();
                    warn!(tag = %tag, error = %e, "tag index lookup failed, falling back to pattern sweep");
                    for pattern in self.config.patterns_for_tag(tag) {
                        self.delete_pattern(&pattern).await;
                    }
                }
            }
        }
    }

    /// Pattern delete: a glob with a single trailing wildcard.
    ///
    /// Memory drops any key containing the literal prefix; the remote
    /// tier matches natively via KEYS and bulk-deletes. Fallback path
    /// for [`CacheManager::invalidate`], kept public for callers that
    /// still invalidate by pattern.
    pub async fn delete_pattern(&self, pattern: &str) {
        let prefix = pattern.trim_end_matches('*');
        let removed = self.memory.remove_containing(prefix);
        self.metrics.record_delete();
        debug!(pattern, removed, "memory pattern sweep");

        let Some(remote) = self.remote().await else {
            return;
        };

        match remote.keys(pattern).await {
            Ok(keys) if keys.is_empty() => {}
            Ok(keys) => {
                if let Err(e) = remote.del(&keys).await {
                    self.metrics.record_error();
                    warn!(pattern, error = %e, "remote pattern delete failed");
                }
            }
            Err(e) => {
                // No further fallback exists beyond this tier
                self.metrics.record_error();
                warn!(pattern, error = %e, "remote pattern match failed");
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Expiry sweep
    // ═══════════════════════════════════════════════════════════════════════════

    /// Drop expired memory entries. Returns the number removed.
    ///
    /// Also runs periodically once [`CacheManager::start`] is called.
    /// Never touches the remote tier - native TTL handles that.
    pub fn clean_expired(&self) -> usize {
        let removed = self.memory.clean_expired();
        record_sweep(removed);
        crate::metrics::set_memory_entries(self.memory.len());
        if removed > 0 {
            debug!(removed, "expiry sweep removed dead entries");
        }
        removed
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, value: serde_json::Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                self.metrics.record_error();
                warn!(key, error = %e, "cached value does not match requested type");
                None
            }
        }
    }
}
