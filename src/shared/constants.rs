/// Maximum number of files accepted in one upload batch.
pub const MAX_BATCH_FILES: usize = 10;

/// Maximum multipart request body size for an upload batch.
pub const MAX_UPLOAD_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Public path prefix under which locally stored files are served.
pub const UPLOADS_PUBLIC_PREFIX: &str = "/uploads";
