use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by session store backends regardless of the underlying technology.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the call.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be encoded or decoded.
    #[error("corrupted record under `{key}`")]
    Corrupted {
        /// Store key of the record.
        key: String,
        /// Serialization failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a serialization error for the record stored under `key`.
    pub fn corrupted(key: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Corrupted {
            key: key.into(),
            source,
        }
    }
}
