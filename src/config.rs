//! Configuration for the cache manager.
//!
//! # Example
//!
//! ```
//! use tiercache::CacheConfig;
//!
//! // Minimal config (uses defaults)
//! let config = CacheConfig::default();
//! assert_eq!(config.default_ttl_secs, 300);
//!
//! // Full config
//! let config = CacheConfig {
//!     remote_url: Some("redis://localhost:6379".into()),
//!     prefix: Some("shop:".into()),
//!     default_ttl_secs: 600,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Environment variables checked for a remote connection string, in order.
/// Two provider naming conventions are accepted: managed KV services hand
/// out a Redis URL under `KV_URL`, plain Redis deployments use `REDIS_URL`.
const REMOTE_URL_VARS: &[&str] = &["KV_URL", "REDIS_URL"];

/// Configuration for the cache manager.
///
/// All fields have sensible defaults. The remote tier is enabled only when
/// a connection string is present, either explicitly via `remote_url` or in
/// the environment; with neither, the cache runs memory-only.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Remote connection string (e.g., "redis://localhost:6379").
    /// When absent, the environment is consulted at call time.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Optional key prefix for namespacing remote keys
    /// (e.g., "shop:" → "shop:products:1")
    #[serde(default)]
    pub prefix: Option<String>,

    /// Whether to fall back to environment variables for the remote URL.
    /// Disable for hermetic tests.
    #[serde(default = "default_env_lookup")]
    pub env_lookup: bool,

    /// Default TTL for writes that don't specify one (seconds)
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// TTL used when a remote hit is promoted back into the memory tier
    #[serde(default = "default_promote_ttl_secs")]
    pub promote_ttl_secs: u64,

    /// Extra TTL granted to a tag-index set beyond its members' TTL,
    /// so the index never expires before the keys it points at
    #[serde(default = "default_tag_index_ttl_margin_secs")]
    pub tag_index_ttl_margin_secs: u64,

    /// Interval between background expiry sweeps of the memory tier
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Default refresh window: entries with this much (or less) time left
    /// are re-fetched by `background_refresh`
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,

    /// Tag → key-prefix patterns used when the remote tag index is
    /// unavailable and invalidation falls back to a pattern sweep.
    /// Injectable so the fallback strategy can change without touching
    /// cache logic.
    #[serde(default = "default_fallback_patterns")]
    pub fallback_patterns: HashMap<String, Vec<String>>,
}

fn default_env_lookup() -> bool { true }
fn default_ttl_secs() -> u64 { 300 }
fn default_promote_ttl_secs() -> u64 { 300 }
fn default_tag_index_ttl_margin_secs() -> u64 { 60 }
fn default_sweep_interval_secs() -> u64 { 300 }
fn default_refresh_threshold_secs() -> u64 { 60 }

fn default_fallback_patterns() -> HashMap<String, Vec<String>> {
    let mut table = HashMap::new();
    for tag in ["products", "news", "categories", "settings"] {
        table.insert(tag.to_string(), vec![format!("{tag}:*")]);
    }
    table
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            prefix: None,
            env_lookup: default_env_lookup(),
            default_ttl_secs: default_ttl_secs(),
            promote_ttl_secs: default_promote_ttl_secs(),
            tag_index_ttl_margin_secs: default_tag_index_ttl_margin_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            fallback_patterns: default_fallback_patterns(),
        }
    }
}

impl CacheConfig {
    /// A config that never enables the remote tier, regardless of
    /// environment. Used by tests and memory-only deployments.
    #[must_use]
    pub fn memory_only() -> Self {
        Self {
            env_lookup: false,
            ..Default::default()
        }
    }

    /// Resolve the remote connection string, if any.
    ///
    /// Evaluated per call rather than cached, so configuration appearing
    /// in the environment mid-process takes effect without a restart.
    #[must_use]
    pub fn remote_url(&self) -> Option<String> {
        if let Some(ref url) = self.remote_url {
            return Some(url.clone());
        }
        if self.env_lookup {
            for var in REMOTE_URL_VARS {
                if let Ok(url) = std::env::var(var) {
                    if !url.is_empty() {
                        return Some(url);
                    }
                }
            }
        }
        None
    }

    /// Patterns to sweep for a tag when the remote tag index can't be
    /// consulted. Table lookup first; otherwise tags with a `-` separator
    /// derive a prefix from the portion before the first dash.
    #[must_use]
    pub fn patterns_for_tag(&self, tag: &str) -> Vec<String> {
        if let Some(patterns) = self.fallback_patterns.get(tag) {
            return patterns.clone();
        }
        if let Some((head, _)) = tag.split_once('-') {
            if !head.is_empty() {
                return vec![format!("{head}:*")];
            }
        }
        Vec::new()
    }
}
