//! Pluggable blob storage for uploaded file bytes.
//!
//! Two interchangeable backends: local disk (served statically under
//! `/uploads`) and an S3-compatible object store addressed by URL. The
//! metadata layer only ever sees opaque location strings.

mod disk;
mod object_store;

#[cfg(test)]
pub mod mock;

pub use disk::DiskStorage;
pub use object_store::ObjectStorage;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::error::Result;

/// Outcome of resolving a stored location back to bytes.
#[derive(Debug)]
pub enum ResolvedBlob {
    /// The bytes themselves, for backends that hold them directly.
    Bytes(Vec<u8>),
    /// A URL the client should be redirected to.
    Redirect(String),
}

/// Storage backend for uploaded file bytes.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `data` under `name` and return the location recorded in the
    /// metadata row (a local relative path or a fully-qualified URL).
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<String>;

    /// Release the bytes at `location`. Already-missing bytes are not an
    /// error; backends only fail on real I/O problems.
    async fn delete(&self, location: &str) -> Result<()>;

    /// Resolve `location` to retrievable bytes or a redirect target.
    async fn resolve(&self, location: &str) -> Result<ResolvedBlob>;
}

/// Generate a collision-resistant stored name: millisecond timestamp token,
/// hyphen, then the original filename stripped of any path components.
pub fn stored_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let base = if base.is_empty() { "unnamed" } else { base };
    format!("{}-{}", Utc::now().timestamp_millis(), base)
}
