/// In-process object store.
///
/// Emulates the delimited listing semantics of S3 over a sorted map.
/// Used by the test suite and by `--store memory` for local development.
/// Every call is counted, and individual operations can be made to fail,
/// so callers can observe exactly what reached the store.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ObjectStore, ObjectSummary, PrefixListing};
use crate::error::{AdminError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Put,
    List,
    Copy,
    Delete,
}

impl StoreOp {
    fn bit(self) -> u8 {
        match self {
            StoreOp::Put => 1,
            StoreOp::List => 1 << 1,
            StoreOp::Copy => 1 << 2,
            StoreOp::Delete => 1 << 3,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    calls: AtomicUsize,
    failing: AtomicU8,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations issued so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent `op` fail (or succeed again).
    pub fn set_failing(&self, op: StoreOp, failing: bool) {
        if failing {
            self.failing.fetch_or(op.bit(), Ordering::SeqCst);
        } else {
            self.failing.fetch_and(!op.bit(), Ordering::SeqCst);
        }
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    fn begin(&self, op: StoreOp, key: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) & op.bit() != 0 {
            return Err(AdminError::Store(format!("{op:?} {key}: injected failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.begin(StoreOp::Put, key)?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list(&self, prefix: &str, delimiter: &str) -> Result<PrefixListing> {
        self.begin(StoreOp::List, prefix)?;
        let objects = self.objects.read().await;

        let mut common = BTreeSet::new();
        let mut listing = PrefixListing::default();

        for (key, obj) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            match rest.find(delimiter).filter(|_| !delimiter.is_empty()) {
                Some(idx) => {
                    common.insert(format!("{prefix}{}", &rest[..idx + delimiter.len()]));
                }
                None => listing.objects.push(ObjectSummary {
                    key: key.clone(),
                    size: obj.body.len() as u64,
                    last_modified: Some(obj.last_modified),
                }),
            }
        }

        listing.common_prefixes = common.into_iter().collect();
        Ok(listing)
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.begin(StoreOp::Copy, from)?;
        if from == to {
            return Err(AdminError::Store(format!(
                "copy {from}: source and destination are the same key"
            )));
        }
        let mut objects = self.objects.write().await;
        let mut obj = objects
            .get(from)
            .cloned()
            .ok_or_else(|| AdminError::Store(format!("copy {from}: no such key")))?;
        obj.last_modified = Utc::now();
        objects.insert(to.to_string(), obj);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.begin(StoreOp::Delete, key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for key in [
            "images/",
            "images/a.png",
            "images/test/",
            "images/test/b.png",
            "images/test/deep/c.png",
            "files/doc.txt",
        ] {
            store.put(key, b"x".to_vec(), "text/plain").await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_delimited_listing() {
        let store = seeded().await;
        let listing = store.list("images/", "/").await.unwrap();

        assert_eq!(listing.common_prefixes, vec!["images/test/".to_string()]);
        let keys: Vec<_> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["images/", "images/a.png"]);
    }

    #[tokio::test]
    async fn test_nested_listing_stops_at_prefix_boundary() {
        let store = seeded().await;
        let listing = store.list("images/test/", "/").await.unwrap();

        assert_eq!(listing.common_prefixes, vec!["images/test/deep/".to_string()]);
        let keys: Vec<_> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["images/test/", "images/test/b.png"]);
    }

    #[tokio::test]
    async fn test_copy_missing_key_fails() {
        let store = MemoryStore::new();
        assert!(store.copy("files/nope", "files/other").await.is_err());
    }

    #[tokio::test]
    async fn test_copy_onto_itself_fails() {
        let store = seeded().await;
        assert!(store.copy("files/doc.txt", "files/doc.txt").await.is_err());
        assert!(store.object("files/doc.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = seeded().await;
        store.delete("files/doc.txt").await.unwrap();
        store.delete("files/doc.txt").await.unwrap();
        assert!(store.object("files/doc.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_count() {
        let store = MemoryStore::new();
        store.set_failing(StoreOp::Put, true);
        assert!(store.put("files/a", vec![], "text/plain").await.is_err());
        store.set_failing(StoreOp::Put, false);
        store.put("files/a", vec![], "text/plain").await.unwrap();
        assert_eq!(store.call_count(), 2);
    }
}
