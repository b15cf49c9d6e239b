use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, list_files, update_file, upload_files,
};
use crate::features::files::services::FileService;
use crate::shared::constants::MAX_UPLOAD_BODY_BYTES;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route(
            "/uploads/files",
            post(upload_files)
                .get(list_files)
                // Allow room for the whole batch plus multipart overhead
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES + 1024 * 1024)),
        )
        .route("/uploads/files/{id}", put(update_file).delete(delete_file))
        .route("/uploads/download/{id}", get(download_file))
        .with_state(file_service)
}
