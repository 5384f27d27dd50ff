//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or writing a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("malformed record at {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record id that cannot be used as a file name.
    #[error("invalid record id: {0:?}")]
    InvalidId(String),

    /// The store configuration is unusable.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Serialization {
            path: path.into(),
            source,
        }
    }

    /// True if the error is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        let missing = StoreError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(missing.is_not_found());
        assert!(missing.to_string().contains("/tmp/x.json"));

        let denied = StoreError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
        );
        assert!(!denied.is_not_found());
        assert!(!StoreError::Config("bad".into()).is_not_found());
    }
}
