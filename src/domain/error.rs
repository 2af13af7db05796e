use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ConfigError(String),
    DatabaseError(String),
    IoError(String),
    /// The import source does not exist.
    FileNotFound(String),
    /// No candidate encoding decoded the file.
    EncodingExhausted(String),
    /// The file decoded but matched none of the known layouts.
    FormatUnrecognized(String),
    /// No connection or transaction could be obtained from the store.
    StorageUnavailable(String),
    /// The import batch failed and was rolled back.
    TransactionFailure(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            AppError::EncodingExhausted(msg) => write!(f, "No usable encoding: {}", msg),
            AppError::FormatUnrecognized(msg) => write!(f, "No usable format found: {}", msg),
            AppError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            AppError::TransactionFailure(msg) => write!(f, "Import rolled back: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err, AppError::IoError("disk".to_string()));
    }

    #[test]
    fn test_display_includes_reason() {
        let err = AppError::FormatUnrecognized("hello world".into());
        assert_eq!(err.to_string(), "No usable format found: hello world");
    }
}
