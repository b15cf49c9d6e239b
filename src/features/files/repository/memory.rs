//! In-memory repository for tests, with failure injection on insert.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::error::{AppError, Result};
use crate::features::files::models::FileRecord;
use crate::features::files::repository::{FileRepository, NewFileRecord};

#[derive(Default)]
pub struct InMemoryFileRepository {
    inner: Mutex<Inner>,
    /// 1-based index of the insert call that fails, if any.
    fail_insert_at: Option<usize>,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    inserts: usize,
    rows: BTreeMap<i32, FileRecord>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_insert_at(n: usize) -> Self {
        Self {
            fail_insert_at: Some(n),
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.inner.lock().expect("lock poisoned").rows.len()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord> {
        let mut inner = self.inner.lock().expect("lock poisoned");

        inner.inserts += 1;
        if self.fail_insert_at == Some(inner.inserts) {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let row = FileRecord {
            id,
            filename: record.filename,
            filepath: record.filepath,
            description: record.description,
            filetype: record.filetype,
        };
        inner.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let inner = self.inner.lock().expect("lock poisoned");
        // BTreeMap iteration is already ascending by id
        Ok(inner.rows.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> Result<Option<FileRecord>> {
        let inner = self.inner.lock().expect("lock poisoned");
        Ok(inner.rows.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i32,
        filename: &str,
        description: &str,
    ) -> Result<Option<FileRecord>> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        Ok(inner.rows.get_mut(&id).map(|row| {
            row.filename = filename.to_string();
            row.description = description.to_string();
            row.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        Ok(inner.rows.remove(&id).is_some())
    }
}
