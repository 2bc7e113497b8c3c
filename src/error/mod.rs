//! Error types for chunkstream.

use std::fmt;

/// Errors that can occur on stream and pool operations.
///
/// Every failure is synchronous, local, and non-retryable: it is reported
/// to the caller immediately and nothing inside the crate retries or
/// recovers on its own. The one deliberate exception is
/// [`ChunkPool::release`] after shutdown, which is a silent no-op rather
/// than an error.
///
/// [`ChunkPool::release`]: crate::ChunkPool::release
#[derive(Debug)]
pub enum StreamError {
    /// The stream was closed, or the pool was shut down.
    Disposed,

    /// A write was attempted on a read-only stream.
    ReadOnly,

    /// A seek or position target outside `[0, length]`.
    OutOfRange {
        /// The requested absolute position.
        target: u64,
        /// The stream length at the time of the call.
        length: u64,
    },

    /// The operation is not supported by this stream type.
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// An I/O error occurred while draining into an external sink.
    Io(std::io::Error),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Disposed => write!(f, "stream or pool already disposed"),
            StreamError::ReadOnly => write!(f, "stream is read-only"),
            StreamError::OutOfRange { target, length } => {
                write!(f, "position {} out of range (length {})", target, length)
            }
            StreamError::Unsupported { operation } => {
                write!(f, "operation not supported: {}", operation)
            }
            StreamError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<StreamError> for std::io::Error {
    fn from(e: StreamError) -> Self {
        use std::io::ErrorKind;

        let kind = match &e {
            StreamError::Disposed => ErrorKind::Other,
            StreamError::ReadOnly => ErrorKind::PermissionDenied,
            StreamError::OutOfRange { .. } => ErrorKind::InvalidInput,
            StreamError::Unsupported { .. } => ErrorKind::Unsupported,
            StreamError::Io(_) => ErrorKind::Other,
        };
        if let StreamError::Io(io) = e {
            return io;
        }
        std::io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "test");
        let err: StreamError = io_err.into();
        matches!(err, StreamError::Io(_));
    }

    #[test]
    fn test_display() {
        let err = StreamError::OutOfRange {
            target: 10,
            length: 7,
        };
        assert!(err.to_string().contains("out of range"));

        let err = StreamError::Unsupported { operation: "set_len" };
        assert!(err.to_string().contains("set_len"));
    }

    #[test]
    fn test_io_kind_mapping() {
        let err: std::io::Error = StreamError::ReadOnly.into();
        assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);

        let err: std::io::Error = StreamError::OutOfRange { target: 1, length: 0 }.into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);

        let err: std::io::Error = StreamError::Unsupported { operation: "write" }.into();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }

    #[test]
    fn test_io_round_trip_preserves_inner() {
        let inner = std::io::Error::new(std::io::ErrorKind::WriteZero, "sink full");
        let err: std::io::Error = StreamError::Io(inner).into();
        assert_eq!(err.kind(), std::io::ErrorKind::WriteZero);
    }
}
