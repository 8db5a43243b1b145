//! Integration tests against real Redis.
//!
//! Tests use testcontainers for portability - no external docker-compose
//! required. Each test namespaces its keys with a unique prefix so a
//! shared Redis instance can't leak state between tests.
//!
//! # Running Tests
//! ```bash
//! # Requires Docker
//! cargo test --test integration -- --ignored
//! ```

use serde_json::{json, Value};

use tiercache::{CacheConfig, CacheManager, WriteOptions};

use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage};

// =============================================================================
// Container Helpers
// =============================================================================

/// Create a Redis container with health check
fn redis_container(docker: &Cli) -> Container<'_, GenericImage> {
    let image = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379)
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));
    docker.run(image)
}

fn test_config(port: u16, test_name: &str) -> CacheConfig {
    CacheConfig {
        remote_url: Some(format!("redis://127.0.0.1:{port}")),
        prefix: Some(format!("{}_{}:", test_name, uuid::Uuid::new_v4())),
        env_lookup: false,
        ..Default::default()
    }
}

// =============================================================================
// Two-tier behavior
// =============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn remote_survives_a_process_restart() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let config = test_config(redis.get_host_port_ipv4(6379), "restart");

    let cache = CacheManager::new(config.clone());
    cache
        .set(
            "products:1",
            &json!({"name": "sencha"}),
            WriteOptions::ttl(120).with_tags(["products"]),
        )
        .await;

    // A second manager with an empty memory tier stands in for a fresh
    // process; the value comes back from Redis and is promoted
    let fresh = CacheManager::new(config);
    let back: Value = fresh.get("products:1").await.expect("remote hit");
    assert_eq!(back, json!({"name": "sencha"}));
    assert_eq!(fresh.info().memory_entries, 1);
    assert_eq!(fresh.metrics().hits, 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn tag_invalidation_clears_both_tiers() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let config = test_config(redis.get_host_port_ipv4(6379), "invalidate");

    let cache = CacheManager::new(config.clone());
    for i in 0..5 {
        cache
            .set(
                &format!("news:{i}"),
                &json!(i),
                WriteOptions::ttl(120).with_tags(["news"]),
            )
            .await;
    }
    cache
        .set(
            "products:1",
            &json!("tea"),
            WriteOptions::ttl(120).with_tags(["products"]),
        )
        .await;

    cache.invalidate(&["news".to_string()]).await;

    // Gone from memory and from Redis (checked via a fresh manager)
    let fresh = CacheManager::new(config);
    for i in 0..5 {
        assert_eq!(fresh.get::<Value>(&format!("news:{i}")).await, None);
    }
    assert_eq!(fresh.get::<Value>("products:1").await, Some(json!("tea")));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn pattern_delete_uses_native_glob() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let config = test_config(redis.get_host_port_ipv4(6379), "pattern");

    let cache = CacheManager::new(config.clone());
    cache.set("products:1", &json!(1), WriteOptions::ttl(120)).await;
    cache.set("products:2", &json!(2), WriteOptions::ttl(120)).await;
    cache.set("news:1", &json!(3), WriteOptions::ttl(120)).await;

    cache.delete_pattern("products:*").await;

    let fresh = CacheManager::new(config);
    assert_eq!(fresh.get::<Value>("products:1").await, None);
    assert_eq!(fresh.get::<Value>("products:2").await, None);
    assert_eq!(fresh.get::<Value>("news:1").await, Some(json!(3)));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn point_delete_and_idempotency() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let config = test_config(redis.get_host_port_ipv4(6379), "delete");

    let cache = CacheManager::new(config.clone());
    cache.set("k", &json!(1), WriteOptions::ttl(120)).await;
    cache.delete("k").await;
    cache.delete("k").await;

    assert_eq!(cache.get::<Value>("k").await, None);
    let fresh = CacheManager::new(config);
    assert_eq!(fresh.get::<Value>("k").await, None);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn native_ttl_expires_remote_entries() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let config = test_config(redis.get_host_port_ipv4(6379), "ttl");

    let cache = CacheManager::new(config.clone());
    cache.set("short", &json!(1), WriteOptions::ttl(1)).await;

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    // Both the local expiry and the Redis EX have passed
    assert_eq!(cache.get::<Value>("short").await, None);
    let fresh = CacheManager::new(config);
    assert_eq!(fresh.get::<Value>("short").await, None);
}

#[tokio::test]
#[ignore] // Slow: waits out the connect retry backoff
async fn unreachable_remote_degrades_to_memory_only() {
    // Nothing listens on this port; connect fails, cache stays usable
    let config = CacheConfig {
        remote_url: Some("redis://127.0.0.1:1".into()),
        env_lookup: false,
        ..Default::default()
    };

    let cache = CacheManager::new(config);
    cache.set("k", &json!(1), WriteOptions::ttl(60)).await;
    assert_eq!(cache.get::<Value>("k").await, Some(json!(1)));
    assert!(cache.metrics().errors > 0);
}
