use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Single-keep invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Unknown review action: {0}")]
    UnknownAction(String),

    #[error("Unknown auto-select strategy: {0}")]
    UnknownStrategy(String),
}

impl Error {
    /// True for failures raised by the persistence collaborator.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Task(_) | Error::StorageUnavailable(_)
        )
    }
}
