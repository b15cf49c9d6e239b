//! Persistence for file metadata rows.
//!
//! The service talks to a trait so the Postgres implementation can be swapped
//! for an in-memory one in tests.

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgFileRepository;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::files::models::FileRecord;

/// Row to insert for a newly stored file.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub filename: String,
    pub filepath: String,
    pub description: String,
    pub filetype: String,
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert one row and return it with its database-assigned id.
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord>;

    /// All rows in ascending id order.
    async fn list(&self) -> Result<Vec<FileRecord>>;

    async fn find(&self, id: i32) -> Result<Option<FileRecord>>;

    /// Overwrite the mutable fields; `None` if the id does not exist.
    async fn update(
        &self,
        id: i32,
        filename: &str,
        description: &str,
    ) -> Result<Option<FileRecord>>;

    /// Remove the row; `false` if the id did not exist.
    async fn delete(&self, id: i32) -> Result<bool>;
}
