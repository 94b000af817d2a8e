use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartylineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PartylineError {
    /// Short error code string for the command layer to render.
    pub fn code(&self) -> &'static str {
        match self {
            PartylineError::Config(_) => "CONFIG_ERROR",
            PartylineError::Database(_) => "DATABASE_ERROR",
            PartylineError::Serialization(_) => "SERIALIZATION_ERROR",
            PartylineError::Io(_) => "IO_ERROR",
            PartylineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PartylineError>;
