use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::files::models::FileRecord;
use crate::features::files::repository::{FileRepository, NewFileRecord};

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord> {
        let inserted = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (filename, filepath, description, filetype)
            VALUES ($1, $2, $3, $4)
            RETURNING id, filename, filepath, description, filetype
            "#,
        )
        .bind(&record.filename)
        .bind(&record.filepath)
        .bind(&record.description)
        .bind(&record.filetype)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, filename, filepath, description, filetype
            FROM files
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find(&self, id: i32) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, filename, filepath, description, filetype
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update(
        &self,
        id: i32,
        filename: &str,
        description: &str,
    ) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            UPDATE files
            SET filename = $1, description = $2
            WHERE id = $3
            RETURNING id, filename, filepath, description, filetype
            "#,
        )
        .bind(filename)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
