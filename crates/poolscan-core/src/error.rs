//! Error types for the poolscan core.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core timeline engine.
#[derive(Error, Debug)]
pub enum Error {
    /// A block id could not be parsed from its hex form.
    #[error("invalid block id: {0}")]
    InvalidHash(String),

    /// I/O error while reading or writing the snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level error while reading or writing the snapshot file.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_hash_display() {
        let err = Error::InvalidHash("expected 32 bytes, got 3".to_string());
        assert!(err.to_string().contains("invalid block id"));
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("no such file"));
    }
}
