//! Storage engine error types
//!
//! Missing sources, channels or time windows are NOT errors: queries over
//! absent data return empty results. Errors cover real failures only.

use thiserror::Error;

/// Errors that can occur in the storage engine
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed (sink write, folder scan)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid option combination (e.g. trim on a non-local sink)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unreadable archive or entry
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// A value could not be encoded for its channel
    #[error("Encode error: {0}")]
    Encode(String),

    /// Writer used after close()
    #[error("Writer is closed")]
    Closed,
}

impl From<zip::result::ZipError> for StorageError {
    fn from(err: zip::result::ZipError) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Config("trim requires a local sink".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: trim requires a local sink"
        );

        let err = StorageError::Closed;
        assert_eq!(err.to_string(), "Writer is closed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }
}
