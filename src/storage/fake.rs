//! In-process stand-in for the remote tier, used by unit tests.
//!
//! Stores values and sets in DashMaps, records the TTLs it was handed
//! (nothing actually expires), and can be told to fail specific
//! operations to exercise the fallback paths.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::traits::{CacheError, RemoteStore};

#[derive(Default)]
pub(crate) struct FakeRemote {
    kv: DashMap<String, String>,
    sets: DashMap<String, BTreeSet<String>>,
    /// Last TTL seen per key, from set_ex or expire
    ttls: DashMap<String, u64>,
    pub get_calls: AtomicUsize,
    pub fail_all: AtomicBool,
    pub fail_smembers: AtomicBool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.kv.contains_key(key)
    }

    pub fn set_members(&self, key: &str) -> Vec<String> {
        self.sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.ttls.get(key).map(|t| *t)
    }

    pub fn kv_len(&self) -> usize {
        self.kv.len()
    }

    fn check_fail(&self, op: &str) -> Result<(), CacheError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(CacheError::Backend(format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail("get")?;
        Ok(self.kv.get(key).map(|v| v.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.check_fail("set_ex")?;
        self.kv.insert(key.to_string(), value.to_string());
        self.ttls.insert(key.to_string(), ttl_secs);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        self.check_fail("del")?;
        for key in keys {
            self.kv.remove(key);
            self.sets.remove(key);
            self.ttls.remove(key);
        }
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), CacheError> {
        self.check_fail("sadd")?;
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.check_fail("smembers")?;
        if self.fail_smembers.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("injected smembers failure".into()));
        }
        Ok(self.set_members(key))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.check_fail("expire")?;
        self.ttls.insert(key.to_string(), ttl_secs);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.check_fail("keys")?;
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .kv
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
