use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::FileRecordDto;
use crate::features::files::models::FileRecord;
use crate::features::files::repository::{FileRepository, NewFileRecord};
use crate::modules::storage::{stored_name, BlobStorage, ResolvedBlob};
use crate::shared::constants::MAX_BATCH_FILES;

/// One uploaded file, as extracted from the multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Service for file operations: batch upload reconciliation plus the
/// list/update/delete/download operations over the metadata table.
pub struct FileService {
    repo: Arc<dyn FileRepository>,
    storage: Arc<dyn BlobStorage>,
}

impl FileService {
    pub fn new(repo: Arc<dyn FileRepository>, storage: Arc<dyn BlobStorage>) -> Self {
        Self { repo, storage }
    }

    /// Align the raw descriptions payload with the file count.
    ///
    /// An absent or blank payload means "no descriptions". A non-array JSON
    /// value is treated as a single-element list. The result is padded with
    /// empty strings or truncated to exactly `count` entries; a surplus is
    /// silently dropped, never an error.
    fn normalize_descriptions(raw: Option<&str>, count: usize) -> Result<Vec<String>> {
        let raw = match raw {
            Some(s) if !s.trim().is_empty() => s,
            _ => "[]",
        };

        let value: serde_json::Value = serde_json::from_str(raw).map_err(|_| {
            AppError::BadRequest("Descriptions must be a valid JSON array".to_string())
        })?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };

        let mut descriptions: Vec<String> = items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        descriptions.resize(count, String::new());
        Ok(descriptions)
    }

    /// Store every file in the batch and insert one metadata row per file.
    ///
    /// Files are persisted strictly sequentially, in submission order. There
    /// is no cross-file transaction: if file k fails, files 0..k-1 stay
    /// durably stored with their rows committed, and the whole request is
    /// reported as failed. That partial-durability contract is deliberate.
    pub async fn upload_batch(
        &self,
        files: Vec<UploadedFile>,
        raw_descriptions: Option<String>,
    ) -> Result<Vec<FileRecordDto>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".to_string()));
        }
        if files.len() > MAX_BATCH_FILES {
            return Err(AppError::BadRequest(format!(
                "Too many files: at most {} per upload",
                MAX_BATCH_FILES
            )));
        }

        let descriptions =
            Self::normalize_descriptions(raw_descriptions.as_deref(), files.len())?;

        let mut inserted = Vec::with_capacity(files.len());
        for (file, description) in files.into_iter().zip(descriptions) {
            let name = stored_name(&file.filename);
            let location = self
                .storage
                .put(&name, file.data, &file.content_type)
                .await?;

            debug!("Stored '{}' at {}", file.filename, location);

            let record = self
                .repo
                .insert(NewFileRecord {
                    filename: file.filename,
                    filepath: location,
                    description,
                    filetype: file.content_type,
                })
                .await?;

            info!(
                "File metadata saved: id={}, filepath={}",
                record.id, record.filepath
            );
            inserted.push(record.into());
        }

        Ok(inserted)
    }

    /// All records in ascending id order.
    pub async fn list(&self) -> Result<Vec<FileRecordDto>> {
        let records = self.repo.list().await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Overwrite a record's filename and description.
    pub async fn update(
        &self,
        id: i32,
        filename: &str,
        description: &str,
    ) -> Result<FileRecordDto> {
        self.repo
            .update(id, filename, description)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Remove a record, releasing the stored bytes first.
    ///
    /// The byte release is attempted exactly once and its failure does not
    /// keep the row alive, but any failure still surfaces to the caller.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let record = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let released = self.storage.delete(&record.filepath).await;
        if let Err(e) = &released {
            warn!(
                "Failed to release stored bytes at {}: {}",
                record.filepath, e
            );
        }

        self.repo.delete(id).await?;
        released?;

        info!("File deleted: id={}, filepath={}", id, record.filepath);
        Ok(())
    }

    /// Resolve a record's stored bytes for download.
    pub async fn download(&self, id: i32) -> Result<(FileRecord, ResolvedBlob)> {
        let record = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let blob = self.storage.resolve(&record.filepath).await?;
        Ok((record, blob))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::repository::memory::InMemoryFileRepository;
    use crate::modules::storage::mock::MockBlobStorage;

    fn file(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: "text/plain".to_string(),
            data: data.to_vec(),
        }
    }

    fn service(
        repo: InMemoryFileRepository,
        storage: MockBlobStorage,
    ) -> (Arc<InMemoryFileRepository>, Arc<MockBlobStorage>, FileService) {
        let repo = Arc::new(repo);
        let storage = Arc::new(storage);
        let svc = FileService::new(repo.clone(), storage.clone());
        (repo, storage, svc)
    }

    fn default_service() -> (Arc<InMemoryFileRepository>, Arc<MockBlobStorage>, FileService) {
        service(InMemoryFileRepository::new(), MockBlobStorage::new())
    }

    #[test]
    fn test_normalize_exact_count() {
        let descriptions =
            FileService::normalize_descriptions(Some(r#"["a", "b"]"#), 2).unwrap();
        assert_eq!(descriptions, vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_pads_with_empty_strings() {
        let descriptions =
            FileService::normalize_descriptions(Some(r#"["first"]"#), 3).unwrap();
        assert_eq!(descriptions, vec!["first", "", ""]);
    }

    #[test]
    fn test_normalize_truncates_surplus() {
        let descriptions =
            FileService::normalize_descriptions(Some(r#"["a", "b", "c"]"#), 1).unwrap();
        assert_eq!(descriptions, vec!["a"]);
    }

    #[test]
    fn test_normalize_wraps_scalar() {
        let descriptions =
            FileService::normalize_descriptions(Some(r#""just one""#), 2).unwrap();
        assert_eq!(descriptions, vec!["just one", ""]);
    }

    #[test]
    fn test_normalize_renders_non_string_elements() {
        let descriptions =
            FileService::normalize_descriptions(Some(r#"[1, {"k": "v"}]"#), 2).unwrap();
        assert_eq!(descriptions, vec!["1", r#"{"k":"v"}"#]);
    }

    #[test]
    fn test_normalize_absent_or_blank_means_empty() {
        assert_eq!(
            FileService::normalize_descriptions(None, 2).unwrap(),
            vec!["", ""]
        );
        assert_eq!(
            FileService::normalize_descriptions(Some(""), 1).unwrap(),
            vec![""]
        );
        assert_eq!(
            FileService::normalize_descriptions(Some("   "), 1).unwrap(),
            vec![""]
        );
    }

    #[test]
    fn test_normalize_rejects_invalid_json() {
        let err = FileService::normalize_descriptions(Some("not json"), 1).unwrap_err();
        match err {
            AppError::BadRequest(msg) => {
                assert_eq!(msg, "Descriptions must be a valid JSON array");
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_batch_aligns_descriptions_positionally() {
        let (_repo, _storage, svc) = default_service();

        let records = svc
            .upload_batch(
                vec![file("a.txt", b"aaa"), file("b.txt", b"bbb")],
                Some(r#"["first"]"#.to_string()),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].filename, "a.txt");
        assert_eq!(records[0].description, "first");
        assert_eq!(records[1].filename, "b.txt");
        assert_eq!(records[1].description, "");
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
        assert!(records[0].filepath.starts_with("/uploads/"));
        assert!(records[0].filepath.ends_with("-a.txt"));
    }

    #[tokio::test]
    async fn test_upload_batch_empty_files_rejected_before_decoding() {
        let (repo, storage, svc) = default_service();

        // Malformed descriptions, but the empty file list wins.
        let err = svc
            .upload_batch(vec![], Some("not json".to_string()))
            .await
            .unwrap_err();

        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "No files uploaded"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
        assert_eq!(repo.row_count(), 0);
        assert_eq!(storage.blob_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_batch_invalid_descriptions_persists_nothing() {
        let (repo, storage, svc) = default_service();

        let err = svc
            .upload_batch(vec![file("a.txt", b"x")], Some("{broken".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(repo.row_count(), 0);
        assert_eq!(storage.blob_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_batch_rejects_oversized_batch() {
        let (repo, _storage, svc) = default_service();

        let files = (0..MAX_BATCH_FILES + 1)
            .map(|i| file(&format!("f{}.txt", i), b"x"))
            .collect();

        let err = svc.upload_batch(files, None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(repo.row_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_batch_storage_failure_keeps_prior_files() {
        let (repo, storage, svc) = service(
            InMemoryFileRepository::new(),
            MockBlobStorage::failing_put_at(3),
        );

        let files = (0..5).map(|i| file(&format!("f{}.txt", i), b"x")).collect();
        let err = svc.upload_batch(files, None).await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        // Files 0 and 1 were persisted before the failure and stay committed.
        assert_eq!(repo.row_count(), 2);
        assert_eq!(storage.blob_count(), 2);

        let remaining = svc.list().await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].filename, "f0.txt");
        assert_eq!(remaining[1].filename, "f1.txt");
    }

    #[tokio::test]
    async fn test_upload_batch_insert_failure_keeps_prior_rows() {
        let (repo, storage, svc) = service(
            InMemoryFileRepository::failing_insert_at(2),
            MockBlobStorage::new(),
        );

        let err = svc
            .upload_batch(
                vec![file("a.txt", b"x"), file("b.txt", b"y"), file("c.txt", b"z")],
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(repo.row_count(), 1);
        // The second file's bytes were written before its insert failed.
        assert_eq!(storage.blob_count(), 2);
    }

    #[tokio::test]
    async fn test_update_overwrites_mutable_fields_only() {
        let (_repo, _storage, svc) = default_service();
        let records = svc
            .upload_batch(vec![file("a.txt", b"x")], Some(r#"["old"]"#.to_string()))
            .await
            .unwrap();

        let updated = svc.update(records[0].id, "renamed.txt", "new").await.unwrap();
        assert_eq!(updated.filename, "renamed.txt");
        assert_eq!(updated.description, "new");
        assert_eq!(updated.id, records[0].id);
        assert_eq!(updated.filepath, records[0].filepath);
        assert_eq!(updated.filetype, records[0].filetype);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found_and_leaves_table_unchanged() {
        let (repo, _storage, svc) = default_service();
        svc.upload_batch(vec![file("a.txt", b"x")], None)
            .await
            .unwrap();

        let err = svc.update(999, "x", "y").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        assert_eq!(repo.row_count(), 1);
        let records = svc.list().await.unwrap();
        assert_eq!(records[0].filename, "a.txt");
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_releases_bytes_once() {
        let (repo, storage, svc) = default_service();
        let records = svc
            .upload_batch(vec![file("a.txt", b"x")], None)
            .await
            .unwrap();

        svc.delete(records[0].id).await.unwrap();

        assert_eq!(repo.row_count(), 0);
        assert_eq!(storage.delete_calls(), 1);
        assert!(!storage.contains(&records[0].filepath));
    }

    #[tokio::test]
    async fn test_delete_release_failure_surfaces_but_row_still_removed() {
        let (repo, storage, svc) = service(
            InMemoryFileRepository::new(),
            MockBlobStorage::failing_deletes(),
        );
        let records = svc
            .upload_batch(vec![file("a.txt", b"x")], None)
            .await
            .unwrap();

        let err = svc.delete(records[0].id).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(storage.delete_calls(), 1);
        // The failed byte release does not keep the row alive.
        assert_eq!(repo.row_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let (_repo, storage, svc) = default_service();

        let err = svc.delete(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(storage.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_ascending_id() {
        let (_repo, _storage, svc) = default_service();
        svc.upload_batch(
            vec![file("a.txt", b"1"), file("b.txt", b"2"), file("c.txt", b"3")],
            None,
        )
        .await
        .unwrap();

        // Touching the middle record must not change list order.
        svc.update(2, "b2.txt", "changed").await.unwrap();

        let ids: Vec<i32> = svc.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_download_returns_bytes_for_stored_file() {
        let (_repo, _storage, svc) = default_service();
        let records = svc
            .upload_batch(vec![file("a.txt", b"payload")], None)
            .await
            .unwrap();

        let (record, blob) = svc.download(records[0].id).await.unwrap();
        assert_eq!(record.filename, "a.txt");
        match blob {
            ResolvedBlob::Bytes(bytes) => assert_eq!(bytes, b"payload"),
            ResolvedBlob::Redirect(_) => panic!("mock storage returns bytes"),
        }
    }

    #[tokio::test]
    async fn test_download_distinguishes_missing_record_from_missing_bytes() {
        let (_repo, storage, svc) = default_service();
        let records = svc
            .upload_batch(vec![file("a.txt", b"x")], None)
            .await
            .unwrap();

        let err = svc.download(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Row exists but the bytes are gone.
        storage.delete(&records[0].filepath).await.unwrap();
        let err = svc.download(records[0].id).await.unwrap_err();
        assert!(matches!(err, AppError::BlobMissing(_)));
    }
}
