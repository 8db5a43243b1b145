//! # tiercache
//!
//! A tiered cache manager for read-heavy web workloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheManager                          │
//! │  • get / set / delete / invalidate / delete_pattern        │
//! │  • warm_up / background_refresh (batch, per-task outcomes) │
//! │  • start / stop (periodic expiry sweeper)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Memory Tier (L1)                         │
//! │  • DashMap keyed by cache key                              │
//! │  • Absolute expiry timestamps, checked on read             │
//! │  • Tag sets scanned for group invalidation                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   (miss → fetch, hit → promote)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Remote Tier (L2, optional)                   │
//! │  • Redis with native TTL (SET ... EX)                      │
//! │  • Tag index: SET per tag listing member keys              │
//! │  • KEYS glob matching for the pattern-sweep fallback       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The remote tier is enabled purely by configuration presence (explicit
//! URL or `KV_URL`/`REDIS_URL` in the environment); without it, every
//! operation behaves identically from the caller's perspective, minus the
//! remote side effects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiercache::{CacheManager, CacheConfig, WriteOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = CacheManager::new(CacheConfig::default());
//!     cache.start();
//!
//!     cache.set("products:1", &json!({"name": "sencha", "price": 12}),
//!         WriteOptions::ttl(300).with_tags(["products"])).await;
//!
//!     let product: Option<serde_json::Value> = cache.get("products:1").await;
//!     println!("cached: {product:?}");
//!
//!     // Drop every products entry, in both tiers
//!     cache.invalidate(&["products".to_string()]).await;
//!
//!     cache.stop().await;
//! }
//! ```
//!
//! ## Failure Semantics
//!
//! The manager is fail-open: remote outages, decode failures, and
//! indexing errors are counted, logged at `warn`, and converted into
//! benign results (miss for reads, silent skip for writes). Callers
//! always own the authoritative data source; a cache fault degrades
//! latency, never correctness.
//!
//! ## Modules
//!
//! - [`manager`]: the [`CacheManager`] orchestrating both tiers
//! - [`storage`]: memory and Redis tiers, plus the [`RemoteStore`] contract
//! - [`config`]: tunables, remote detection, fallback pattern table
//! - [`metrics`]: counters, snapshots, `metrics`-facade emission
//! - [`retry`]: backoff helper for remote calls

pub mod config;
pub mod entry;
pub mod manager;
pub mod metrics;
pub mod retry;
pub mod storage;

pub use config::CacheConfig;
pub use entry::{CacheEntry, RemoteEnvelope, WriteOptions};
pub use manager::{
    CacheInfo, CacheManager, FetchError, RefreshOutcome, RefreshStatus, RefreshTask,
    WarmupOutcome, WarmupStatus, WarmupTask,
};
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use retry::RetryConfig;
pub use storage::memory::MemoryStore;
pub use storage::remote::RedisStore;
pub use storage::traits::{CacheError, RemoteStore};
