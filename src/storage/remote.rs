//! Redis remote tier.
//!
//! Holds the same values as the memory tier (as JSON envelopes), shared
//! across processes and subject to Redis-native TTL. Also hosts the tag
//! index: one SET per tag (`tag_index:<tag>`) whose members are the cache
//! keys carrying that tag, letting invalidation delete a whole group
//! without a key scan.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, AsyncCommands, Client};

use super::traits::{CacheError, RemoteStore};
use crate::retry::{retry, RetryConfig};

pub struct RedisStore {
    connection: ConnectionManager,
    /// Optional key prefix for namespacing (e.g., "shop:" → "shop:products:1")
    prefix: String,
}

impl RedisStore {
    /// Connect without a key prefix.
    pub async fn connect(connection_string: &str) -> Result<Self, CacheError> {
        Self::with_prefix(connection_string, None).await
    }

    /// Connect with an optional key prefix.
    ///
    /// The prefix is prepended to all keys (tag-index keys included),
    /// enabling namespacing when sharing a Redis instance with other
    /// applications.
    pub async fn with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> Result<Self, CacheError> {
        let client =
            Client::open(connection_string).map_err(|e| CacheError::Backend(e.to_string()))?;

        // Use startup config: fast-fail after a few seconds, don't hang forever
        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    /// Apply the prefix to a key.
    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    /// Strip the prefix from a key (for returning clean keys from KEYS).
    #[inline]
    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.prefix).unwrap_or(key)
        }
    }

    /// Get the configured prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self.connection.clone();
        let prefixed = self.prefixed_key(key);

        retry("redis_get", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = prefixed.clone();
            async move {
                let data: Option<String> = conn.get(&key).await?;
                Ok(data)
            }
        })
        .await
        .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let conn = self.connection.clone();
        let prefixed = self.prefixed_key(key);
        let value = value.to_string();

        retry("redis_set_ex", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = prefixed.clone();
            let value = value.clone();
            async move {
                let _: () = conn.set_ex(&key, &value, ttl_secs).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }

        let conn = self.connection.clone();
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed_key(k)).collect();

        retry("redis_del", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let keys = prefixed.clone();
            async move {
                // DEL is variadic - one round trip for the whole batch
                let _: u64 = cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                Ok(())
            }
        })
        .await
        .map_err(|e: redis::RedisError| CacheError::Backend(e.to_string()))
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let prefixed = self.prefixed_key(key);

        let _: u64 = cmd("SADD")
            .arg(&prefixed)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to add set member: {}", e)))?;

        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection.clone();
        let prefixed = self.prefixed_key(key);

        let members: Vec<String> = cmd("SMEMBERS")
            .arg(&prefixed)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to get set members: {}", e)))?;

        Ok(members)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let prefixed = self.prefixed_key(key);

        let _: i64 = cmd("EXPIRE")
            .arg(&prefixed)
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to set TTL: {}", e)))?;

        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection.clone();
        let prefixed = self.prefixed_key(pattern);

        let keys: Vec<String> = cmd("KEYS")
            .arg(&prefixed)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to match keys: {}", e)))?;

        Ok(keys
            .iter()
            .map(|k| self.strip_prefix(k).to_string())
            .collect())
    }
}
