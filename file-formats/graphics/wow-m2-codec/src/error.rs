use std::io;
use thiserror::Error;

/// Error types for M2 model loading and saving
#[derive(Error, Debug)]
pub enum M2Error {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Version code outside the supported revisions
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    /// A read or a chunk length crosses the end of the stream
    #[error("Truncated data: {0}")]
    Truncated(String),

    /// The object graph cannot be expressed in the requested format
    #[error("Schema error: {0}")]
    Schema(String),

    /// Sequence index past the end of the sequence registry
    #[error("Sequence index {index} out of range ({count} sequences)")]
    SequenceOutOfRange { index: usize, count: usize },

    /// Failure reported by the external file collaborator
    #[error("External file error: {0}")]
    ExternalFile(String),

    /// Error during validation
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<io::Error> for M2Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated(err.to_string())
        } else {
            Self::Io(err)
        }
    }
}

/// Result type using M2Error
pub type Result<T> = std::result::Result<T, M2Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_maps_to_truncation() {
        let err: M2Error = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, M2Error::Truncated(_)));

        let err: M2Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert!(matches!(err, M2Error::Io(_)));
    }

    #[test]
    fn test_display() {
        let err = M2Error::SequenceOutOfRange { index: 4, count: 2 };
        assert_eq!(err.to_string(), "Sequence index 4 out of range (2 sequences)");
    }
}
