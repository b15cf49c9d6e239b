use utoipa::OpenApi;

use crate::core::error::ErrorBody;
use crate::features::files::dtos as files_dtos;
use crate::features::files::handlers::file_handler;

#[derive(OpenApi)]
#[openapi(
    paths(
        file_handler::upload_files,
        file_handler::list_files,
        file_handler::update_file,
        file_handler::delete_file,
        file_handler::download_file,
    ),
    components(
        schemas(
            ErrorBody,
            files_dtos::FileRecordDto,
            files_dtos::UploadBatchDto,
            files_dtos::UploadBatchResponseDto,
            files_dtos::UpdateFileDto,
            files_dtos::UpdateFileResponseDto,
            files_dtos::MessageDto,
        )
    ),
    tags(
        (name = "files", description = "File upload and metadata management")
    ),
    info(
        title = "Filedrop API",
        version = "0.1.0",
        description = "Minimal file upload and metadata service",
    )
)]
pub struct ApiDoc;
