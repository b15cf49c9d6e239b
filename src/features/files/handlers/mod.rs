pub mod file_handler;

pub use file_handler::{delete_file, download_file, list_files, update_file, upload_files};
