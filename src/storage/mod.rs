/// Object store abstraction for the CDN bucket.
///
/// The store is a flat key space. Folders only exist as shared key
/// prefixes or as zero-byte marker objects whose key ends in `/`.
/// A single handle is built at startup and shared by every request.
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One object returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of a delimited prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixListing {
    /// Prefixes one level below the queried prefix, each ending in the
    /// delimiter.
    pub common_prefixes: Vec<String>,
    /// Objects directly under the queried prefix.
    pub objects: Vec<ObjectSummary>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Human-readable name of this store (e.g., "S3").
    fn name(&self) -> &str;

    /// Write an object, replacing any object already at `key`.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// List the level directly below `prefix`, grouping deeper keys by
    /// `delimiter`.
    async fn list(&self, prefix: &str, delimiter: &str) -> Result<PrefixListing>;

    /// Server-side copy of `from` to `to`.
    async fn copy(&self, from: &str, to: &str) -> Result<()>;

    /// Delete an object. Returns Ok even if the object doesn't exist.
    async fn delete(&self, key: &str) -> Result<()>;
}
