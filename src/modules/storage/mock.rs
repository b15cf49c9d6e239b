//! In-memory blob storage for tests, with failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::error::{AppError, Result};
use crate::modules::storage::{BlobStorage, ResolvedBlob};

#[derive(Default)]
pub struct MockBlobStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    /// 1-based index of the put call that fails, if any.
    fail_put_at: Option<usize>,
    fail_deletes: bool,
}

impl MockBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_put_at(n: usize) -> Self {
        Self {
            fail_put_at: Some(n),
            ..Self::default()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().expect("lock poisoned").len()
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, location: &str) -> bool {
        self.blobs
            .lock()
            .expect("lock poisoned")
            .contains_key(location)
    }
}

#[async_trait]
impl BlobStorage for MockBlobStorage {
    async fn put(&self, name: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_put_at == Some(n) {
            return Err(AppError::Storage(format!("injected failure on put #{}", n)));
        }

        let location = format!("/uploads/{}", name);
        self.blobs
            .lock()
            .expect("lock poisoned")
            .insert(location.clone(), data);
        Ok(location)
    }

    async fn delete(&self, location: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(AppError::Storage("injected delete failure".to_string()));
        }

        self.blobs.lock().expect("lock poisoned").remove(location);
        Ok(())
    }

    async fn resolve(&self, location: &str) -> Result<ResolvedBlob> {
        self.blobs
            .lock()
            .expect("lock poisoned")
            .get(location)
            .map(|bytes| ResolvedBlob::Bytes(bytes.clone()))
            .ok_or_else(|| AppError::BlobMissing(location.to_string()))
    }
}
