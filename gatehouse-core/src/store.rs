//! Key-value storage abstraction
//!
//! All persistent state (accounts, tokens) lives behind the [`KvStore`]
//! trait: string keys mapped to serialized JSON values. The two conditional
//! primitives carry the concurrency guarantees the rest of the crate relies
//! on:
//!
//! - [`KvStore::set_if_absent`] makes account creation atomic, so two
//!   concurrent registrations for the same email produce exactly one account.
//! - [`KvStore::compare_and_swap`] makes token redemption at-most-once, so a
//!   token raced by two requests is consumed by exactly one of them.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StorageError;

#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Get the value stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Unconditionally store `value` at `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Store `value` at `key` only if the key does not exist yet.
    ///
    /// Returns `true` if the value was written, `false` if the key was taken.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StorageError>;

    /// Replace the value at `key` only if it currently equals `expected`.
    ///
    /// Returns `true` if the swap happened, `false` if the key was missing or
    /// held a different value.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        value: &str,
    ) -> Result<bool, StorageError>;

    /// Delete the value at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List every `(key, value)` pair whose key starts with `prefix`.
    ///
    /// Backs the periodic token sweep; stores with native TTL support may
    /// return an empty list and expire records themselves.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError>;
}

/// In-memory store backed by a concurrent hash map.
///
/// The production deployment would sit on a store with native TTL support;
/// this backend is for development and tests, where expiry is enforced
/// logically by the token layer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StorageError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(value.to_string());
                Ok(true)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        value: &str,
    ) -> Result<bool, StorageError> {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.value().as_str() == expected => {
                *entry.value_mut() = value.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("key", "value").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));

        store.set("key", "other").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("other".to_string()));

        store.delete("key").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), None);

        // Deleting a missing key is fine
        store.delete("key").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let store = MemoryStore::new();

        assert!(store.set_if_absent("key", "first").await.unwrap());
        assert!(!store.set_if_absent("key", "second").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryStore::new();

        // Missing key never swaps
        assert!(!store.compare_and_swap("key", "a", "b").await.unwrap());

        store.set("key", "a").await.unwrap();
        assert!(store.compare_and_swap("key", "a", "b").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), Some("b".to_string()));

        // Stale expectation fails and leaves the value untouched
        assert!(!store.compare_and_swap("key", "a", "c").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let store = MemoryStore::new();
        store.set("token:a", "1").await.unwrap();
        store.set("token:b", "2").await.unwrap();
        store.set("user:alice", "3").await.unwrap();

        let mut scanned = store.scan_prefix("token:").await.unwrap();
        scanned.sort();
        assert_eq!(
            scanned,
            vec![
                ("token:a".to_string(), "1".to_string()),
                ("token:b".to_string(), "2".to_string()),
            ]
        );

        assert!(store.scan_prefix("session:").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_set_if_absent_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_if_absent("key", &format!("writer-{i}")).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
