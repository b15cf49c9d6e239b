use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::files::models::FileRecord;

/// One metadata record, mirroring a row of the files table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileRecordDto {
    /// Database-assigned identifier
    pub id: i32,
    /// Original client-supplied filename
    pub filename: String,
    /// Local relative path or object-store URL for the stored bytes
    pub filepath: String,
    pub description: String,
    /// Declared MIME type
    pub filetype: String,
}

impl From<FileRecord> for FileRecordDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            filepath: record.filepath,
            description: record.description,
            filetype: record.filetype,
        }
    }
}

/// Upload form for OpenAPI documentation only; the handler drives axum's
/// Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadBatchDto {
    /// The files to upload (up to 10 per request)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub datas: Vec<String>,
    /// JSON array of descriptions, aligned positionally with `datas`
    #[schema(example = r#"["first", "second"]"#)]
    pub descriptions: Option<String>,
}

/// Response for a successful upload batch
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadBatchResponseDto {
    pub message: String,
    pub files: Vec<FileRecordDto>,
}

/// Request body for updating a record's mutable fields
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateFileDto {
    #[validate(length(min = 1, message = "filename must not be empty"))]
    pub filename: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateFileResponseDto {
    pub message: String,
    pub file: FileRecordDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    pub message: String,
}
