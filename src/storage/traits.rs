use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("remote backend error: {0}")]
    Backend(String),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Wire contract consumed from the remote key-value store.
///
/// The manager composes everything it needs out of these primitives:
/// value reads/writes with native TTL, variadic delete, set operations
/// for the tag index, TTL extension, and glob key matching for the
/// pattern-sweep fallback. Behind a trait so tests can substitute an
/// in-process fake.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// `SET key value EX ttl_secs` - expiry is the store's own, not ours.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    /// Variadic delete. Deleting missing keys is not an error.
    async fn del(&self, keys: &[String]) -> Result<(), CacheError>;

    /// Add a member to a set-typed key.
    async fn sadd(&self, key: &str, member: &str) -> Result<(), CacheError>;

    /// List all members of a set-typed key. Missing key yields an empty list.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError>;

    /// Set/extend the TTL on an existing key.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), CacheError>;

    /// All keys matching a glob pattern (single trailing wildcard).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}
