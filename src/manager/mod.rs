// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache manager.
//!
//! The [`CacheManager`] is the single entry point tying the tiers together:
//! - Memory tier: process-local DashMap with TTL expiry and a periodic sweep
//! - Remote tier (optional): Redis with native TTL and the tag index
//!
//! Reads consult memory first, then the remote tier (promoting hits back
//! into memory); writes go to both tiers and populate the tag index. The
//! whole surface is fail-open: a remote outage degrades to memory-only
//! behavior, never to an error at the call site.
//!
//! # Example
//!
//! ```rust,no_run
//! use tiercache::{CacheManager, CacheConfig, WriteOptions};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cache = CacheManager::new(CacheConfig::default());
//! cache.start(); // background expiry sweeper
//!
//! cache.set("products:1", &json!({"name": "sencha"}),
//!     WriteOptions::ttl(300).with_tags(["products"])).await;
//!
//! if let Some(product) = cache.get::<serde_json::Value>("products:1").await {
//!     println!("cached: {product}");
//! }
//!
//! cache.invalidate(&["products".to_string()]).await;
//! cache.stop().await;
//! # }
//! ```

mod api;
mod lifecycle;
mod refresh;

pub use refresh::{
    FetchError, RefreshOutcome, RefreshStatus, RefreshTask, WarmupOutcome, WarmupStatus,
    WarmupTask,
};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CacheConfig;
use crate::metrics::{CacheMetrics, MetricsSnapshot};
use crate::storage::memory::MemoryStore;
use crate::storage::remote::RedisStore;
use crate::storage::traits::RemoteStore;

use lifecycle::Sweeper;

/// Remote set key holding the cache keys carrying a tag.
pub(super) fn tag_index_key(tag: &str) -> String {
    format!("tag_index:{tag}")
}

/// Tiered cache manager.
///
/// A plain long-lived instance: construct once at process start and pass
/// by reference to callers. No global state, so tests can build fresh
/// instances freely.
///
/// # Thread Safety
///
/// `Send + Sync`, designed for concurrent access. There is no
/// single-flight deduplication: two tasks that miss the same key
/// concurrently will both fetch and both `set`; the last write wins
/// per tier.
pub struct CacheManager {
    pub(super) config: CacheConfig,

    /// Memory tier
    pub(super) memory: Arc<MemoryStore>,

    /// Remote tier, connected lazily the first time configuration is
    /// present at call time
    pub(super) remote: RwLock<Option<Arc<dyn RemoteStore>>>,

    pub(super) metrics: Arc<CacheMetrics>,

    /// Background expiry sweeper, held while running
    pub(super) sweeper: Mutex<Option<Sweeper>>,
}

impl CacheManager {
    /// Create a manager. The remote tier connects on first use, and only
    /// if a connection string is configured (see [`CacheConfig::remote_url`]).
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            memory: Arc::new(MemoryStore::new()),
            remote: RwLock::new(None),
            metrics: Arc::new(CacheMetrics::new()),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a manager with an already-constructed remote tier.
    ///
    /// Skips environment detection entirely; useful for embedding a
    /// custom [`RemoteStore`] or wiring a fake in tests.
    #[must_use]
    pub fn with_remote(config: CacheConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let manager = Self::new(config);
        *manager.remote.write() = Some(remote);
        manager
    }

    /// Whether the remote tier is usable right now: either a live
    /// connection is held, or configuration for one is present.
    /// Evaluated per call - configuration appearing mid-process counts.
    #[must_use]
    pub fn remote_available(&self) -> bool {
        self.remote.read().is_some() || self.config.remote_url().is_some()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zero all counters and the latency window.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Size and availability summary plus the counter snapshot.
    #[must_use]
    pub fn info(&self) -> CacheInfo {
        let remote_available = self.remote_available();
        crate::metrics::set_memory_entries(self.memory.len());
        crate::metrics::set_remote_available(remote_available);
        CacheInfo {
            memory_entries: self.memory.len(),
            remote_available,
            metrics: self.metrics.snapshot(),
        }
    }

    /// Resolve the remote tier, connecting lazily if configuration is
    /// present and no connection is held yet. Connection failures are
    /// counted and swallowed - the caller proceeds memory-only.
    pub(super) async fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        if let Some(remote) = self.remote.read().clone() {
            return Some(remote);
        }

        let url = self.config.remote_url()?;
        match RedisStore::with_prefix(&url, self.config.prefix.as_deref()).await {
            Ok(store) => {
                let store: Arc<dyn RemoteStore> = Arc::new(store);
                // A racing connect may have won; either connection works
                *self.remote.write() = Some(store.clone());
                info!("Remote cache tier connected");
                Some(store)
            }
            Err(e) => {
                self.metrics.record_error();
                warn!(error = %e, "Remote cache tier unreachable, continuing memory-only");
                None
            }
        }
    }
}

/// Summary returned by [`CacheManager::info`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub memory_entries: usize,
    pub remote_available: bool,
    pub metrics: MetricsSnapshot,
}
