// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic tiercache usage example.
//!
//! Demonstrates:
//! 1. Configuring the cache (Redis optional - set REDIS_URL to enable L2)
//! 2. Writing tagged entries
//! 3. Reading them back
//! 4. Tag invalidation
//! 5. Warm-up with per-task outcomes
//! 6. Displaying metrics (OTEL-compatible)
//! 7. Clean shutdown
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! # or with a remote tier:
//! REDIS_URL=redis://localhost:6379 cargo run --example basic_usage
//! ```

use metrics_util::debugging::DebuggingRecorder;
use serde_json::{json, Value};
use tiercache::{CacheConfig, CacheManager, WarmupTask, WriteOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install metrics recorder (captures all facade metrics)
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    // Simple logging (no filter for simplicity)
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("=== tiercache: basic usage ===\n");

    let cache = CacheManager::new(CacheConfig::default());
    cache.start();
    println!(
        "remote tier: {}",
        if cache.remote_available() { "enabled" } else { "memory-only" }
    );

    // 1. Write some tagged entries
    cache
        .set(
            "products:1",
            &json!({"name": "sencha", "price": 12}),
            WriteOptions::ttl(300).with_tags(["products"]),
        )
        .await;
    cache
        .set(
            "products:2",
            &json!({"name": "gyokuro", "price": 28}),
            WriteOptions::ttl(300).with_tags(["products"]),
        )
        .await;
    cache
        .set(
            "news:launch",
            &json!({"title": "spring blends are here"}),
            WriteOptions::ttl(60).with_tags(["news"]),
        )
        .await;

    // 2. Read them back
    let product: Value = cache.get("products:1").await.expect("cached");
    println!("products:1 = {product}");

    // 3. Warm-up: already-cached keys are skipped, cold ones fetched
    let outcomes = cache
        .warm_up(vec![
            WarmupTask::new("products:1", WriteOptions::ttl(300), || {
                Box::pin(async { Ok(json!({"name": "should not run"})) })
            }),
            WarmupTask::new("categories:green", WriteOptions::ttl(300), || {
                Box::pin(async { Ok(json!({"teas": ["sencha", "gyokuro"]})) })
            }),
        ])
        .await;
    for outcome in &outcomes {
        println!("warm-up {}: {:?}", outcome.key, outcome.status);
    }

    // 4. Invalidate every products entry in one call
    cache.invalidate(&["products".to_string()]).await;
    println!(
        "after invalidation, products:1 = {:?}",
        cache.get::<Value>("products:1").await
    );

    // 5. Counter snapshot + facade metrics
    let info = cache.info();
    println!(
        "\nentries={} remote={} hits={} misses={} hit_rate={:.2}",
        info.memory_entries,
        info.remote_available,
        info.metrics.hits,
        info.metrics.misses,
        info.metrics.hit_rate,
    );
    println!("facade metrics captured: {}", snapshotter.snapshot().into_vec().len());

    cache.stop().await;
    Ok(())
}
