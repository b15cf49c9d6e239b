use sqlx::FromRow;

/// Database model for the files table
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: i32,
    pub filename: String,
    pub filepath: String,
    pub description: String,
    pub filetype: String,
}
