use thiserror::Error;

/// Errors from the ban list.
#[derive(Debug, Error)]
pub enum BanError {
    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, BanError>;
