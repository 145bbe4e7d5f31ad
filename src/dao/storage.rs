use std::error::Error;
use thiserror::Error;

/// Result alias for identity and catalog operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of a storage backend, independent of the database behind it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or answered with an error.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend description of the failure.
        message: String,
        /// Underlying error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness constraint (handle or nickname) rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StorageError {
    /// Wrap any backend failure as [`StorageError::Unavailable`].
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
