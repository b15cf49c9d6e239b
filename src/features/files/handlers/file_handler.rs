use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{
    FileRecordDto, MessageDto, UpdateFileDto, UpdateFileResponseDto, UploadBatchDto,
    UploadBatchResponseDto,
};
use crate::features::files::services::{FileService, UploadedFile};
use crate::modules::storage::ResolvedBlob;

/// Upload a batch of files
///
/// Accepts multipart/form-data with repeated `datas` file fields and an
/// optional `descriptions` field holding a JSON array aligned positionally
/// with the files. The batch either succeeds as a whole or reports a single
/// failure; files persisted before a mid-batch failure stay persisted.
#[utoipa::path(
    post,
    path = "/uploads/files",
    tag = "files",
    request_body(
        content = UploadBatchDto,
        content_type = "multipart/form-data",
        description = "Up to 10 `datas` file fields plus an optional `descriptions` JSON array",
    ),
    responses(
        (status = 200, description = "All files stored and recorded", body = UploadBatchResponseDto),
        (status = 400, description = "No files, too many files, or malformed descriptions"),
        (status = 500, description = "Storage or database error")
    )
)]
pub async fn upload_files(
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<Json<UploadBatchResponseDto>> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut raw_descriptions: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "datas" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                files.push(UploadedFile {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "descriptions" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read descriptions field: {}", e))
                })?;
                raw_descriptions = Some(text);
            }
            other => {
                debug!("Ignoring unknown field: {}", other);
            }
        }
    }

    let records = service.upload_batch(files, raw_descriptions).await?;

    Ok(Json(UploadBatchResponseDto {
        message: "Files uploaded successfully!".to_string(),
        files: records,
    }))
}

/// List all file records, ascending by id
#[utoipa::path(
    get,
    path = "/uploads/files",
    tag = "files",
    responses(
        (status = 200, description = "All records", body = Vec<FileRecordDto>),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
) -> Result<Json<Vec<FileRecordDto>>> {
    let records = service.list().await?;
    Ok(Json(records))
}

/// Update a record's filename and description
#[utoipa::path(
    put,
    path = "/uploads/files/{id}",
    tag = "files",
    params(
        ("id" = i32, Path, description = "Record id")
    ),
    request_body = UpdateFileDto,
    responses(
        (status = 200, description = "Record updated", body = UpdateFileResponseDto),
        (status = 400, description = "Invalid body"),
        (status = 404, description = "Unknown id"),
        (status = 500, description = "Database error")
    )
)]
pub async fn update_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<i32>,
    Json(dto): Json<UpdateFileDto>,
) -> Result<Json<UpdateFileResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.update(id, &dto.filename, &dto.description).await?;

    Ok(Json(UpdateFileResponseDto {
        message: "File updated successfully!".to_string(),
        file,
    }))
}

/// Delete a record and release its stored bytes
#[utoipa::path(
    delete,
    path = "/uploads/files/{id}",
    tag = "files",
    params(
        ("id" = i32, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record deleted", body = MessageDto),
        (status = 404, description = "Unknown id"),
        (status = 500, description = "Storage or database error")
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<i32>,
) -> Result<Json<MessageDto>> {
    service.delete(id).await?;

    Ok(Json(MessageDto {
        message: "File deleted successfully".to_string(),
    }))
}

/// Download a record's bytes under its original filename
#[utoipa::path(
    get,
    path = "/uploads/download/{id}",
    tag = "files",
    params(
        ("id" = i32, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "File bytes as attachment"),
        (status = 307, description = "Redirect to the object-store URL"),
        (status = 404, description = "Record or stored bytes missing"),
        (status = 500, description = "Storage or database error")
    )
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<i32>,
) -> Result<Response> {
    let (record, blob) = service.download(id).await?;

    match blob {
        ResolvedBlob::Bytes(bytes) => {
            let content_type = HeaderValue::from_str(&record.filetype)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                record.filename.replace('"', "")
            ))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

            Ok((
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        ResolvedBlob::Redirect(url) => Ok(Redirect::temporary(&url).into_response()),
    }
}
