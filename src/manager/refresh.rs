// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Warm-up and refresh-before-expiry.
//!
//! Both take batches of caller-supplied fetch tasks and run them
//! concurrently with per-task failure isolation: one slow or broken
//! fetcher never affects its siblings. Outcomes come back as a
//! structured list, one per task, so callers can assert on results
//! instead of scraping logs.
//!
//! The cache never schedules refreshes itself - callers drive
//! [`CacheManager::background_refresh`] on their own cadence (a periodic
//! job, typically) with the same fetchers they used for the original
//! writes. That is what realizes the `stale_while_revalidate` intent
//! declared at write time.

use futures::future::{join_all, BoxFuture};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

use super::CacheManager;
use crate::entry::WriteOptions;

/// Errors produced by caller-supplied fetchers.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

type BoxedFetcher = Box<dyn Fn() -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync>;

/// One warm-up unit: pre-populate `key` unless it is already cached.
pub struct WarmupTask {
    pub key: String,
    pub options: WriteOptions,
    fetcher: BoxedFetcher,
}

impl WarmupTask {
    pub fn new<F, Fut>(key: impl Into<String>, options: WriteOptions, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
    {
        Self {
            key: key.into(),
            options,
            fetcher: Box::new(move || Box::pin(fetcher())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmupStatus {
    /// Fetched and cached
    Warmed,
    /// Already cached; the fetcher was not invoked
    Skipped,
    /// Fetcher failed; siblings unaffected
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct WarmupOutcome {
    pub key: String,
    pub status: WarmupStatus,
}

/// One refresh unit: re-fetch `key` when its remaining TTL is inside
/// the threshold window.
pub struct RefreshTask {
    pub key: String,
    pub options: WriteOptions,
    /// Refresh when remaining TTL is at or below this many seconds
    pub threshold_secs: u64,
    fetcher: BoxedFetcher,
}

impl RefreshTask {
    /// Task with the default 60 s threshold.
    pub fn new<F, Fut>(key: impl Into<String>, options: WriteOptions, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
    {
        Self {
            key: key.into(),
            options,
            threshold_secs: 60,
            fetcher: Box::new(move || Box::pin(fetcher())),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold_secs: u64) -> Self {
        self.threshold_secs = threshold_secs;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Entry was approaching expiry; re-fetched and both tiers reset
    Refreshed,
    /// Entry has more than `threshold_secs` left; nothing to do
    Fresh,
    /// No live memory entry for this key; nothing to refresh
    Absent,
    /// Fetcher failed; the old entry stays until it expires
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub key: String,
    pub status: RefreshStatus,
}

impl CacheManager {
    /// Pre-populate entries before real traffic asks for them.
    ///
    /// Per task: if `get` already returns a value, skip without invoking
    /// the fetcher; otherwise fetch and `set`. Tasks run concurrently and
    /// failures are isolated per task.
    pub async fn warm_up(&self, tasks: Vec<WarmupTask>) -> Vec<WarmupOutcome> {
        let outcomes = join_all(tasks.into_iter().map(|task| async move {
            let WarmupTask {
                key,
                options,
                fetcher,
            } = task;

            if self.get::<Value>(&key).await.is_some() {
                debug!(key = %key, "warm-up skipped, already cached");
                return WarmupOutcome {
                    key,
                    status: WarmupStatus::Skipped,
                };
            }

            match fetcher().await {
                Ok(value) => {
                    self.set(&key, &value, options).await;
                    self.metrics.record_warmup();
                    WarmupOutcome {
                        key,
                        status: WarmupStatus::Warmed,
                    }
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "warm-up fetch failed");
                    WarmupOutcome {
                        key,
                        status: WarmupStatus::Failed(e.to_string()),
                    }
                }
            }
        }))
        .await;

        let warmed = outcomes.iter().filter(|o| o.status == WarmupStatus::Warmed).count();
        let skipped = outcomes.iter().filter(|o| o.status == WarmupStatus::Skipped).count();
        let failed = outcomes.len() - warmed - skipped;
        info!(warmed, skipped, failed, "warm-up batch finished");

        outcomes
    }

    /// Refresh entries that are approaching expiry, before they die.
    ///
    /// Per task: skip when no live memory entry exists; skip when more
    /// than `threshold_secs` remain; otherwise re-fetch and `set`,
    /// resetting expiry in both tiers while the old value is still being
    /// served - concurrent readers never observe a miss during the
    /// refresh window.
    pub async fn background_refresh(&self, tasks: Vec<RefreshTask>) -> Vec<RefreshOutcome> {
        let outcomes = join_all(tasks.into_iter().map(|task| async move {
            let RefreshTask {
                key,
                options,
                threshold_secs,
                fetcher,
            } = task;

            let Some(remaining) = self.memory.remaining(&key) else {
                debug!(key = %key, "refresh skipped, no live entry");
                return RefreshOutcome {
                    key,
                    status: RefreshStatus::Absent,
                };
            };

            if remaining > std::time::Duration::from_secs(threshold_secs) {
                return RefreshOutcome {
                    key,
                    status: RefreshStatus::Fresh,
                };
            }

            match fetcher().await {
                Ok(value) => {
                    self.set(&key, &value, options).await;
                    self.metrics.record_refresh();
                    debug!(key = %key, remaining_secs = remaining.as_secs(), "refreshed before expiry");
                    RefreshOutcome {
                        key,
                        status: RefreshStatus::Refreshed,
                    }
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "background refresh fetch failed");
                    RefreshOutcome {
                        key,
                        status: RefreshStatus::Failed(e.to_string()),
                    }
                }
            }
        }))
        .await;

        let refreshed = outcomes.iter().filter(|o| o.status == RefreshStatus::Refreshed).count();
        if refreshed > 0 {
            info!(refreshed, total = outcomes.len(), "background refresh batch finished");
        }

        outcomes
    }
}
