mod file_dto;

pub use file_dto::{
    FileRecordDto, MessageDto, UpdateFileDto, UpdateFileResponseDto, UploadBatchDto,
    UploadBatchResponseDto,
};
