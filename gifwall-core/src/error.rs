//! Error types and decode status codes for the gifwall engine.

use thiserror::Error;

/// Decode session status.
///
/// Parsing and decoding of untrusted byte streams never surface failure
/// through `Result`; they record it here instead. Once a session reports
/// [`Status::FormatError`] or [`Status::OpenError`] the status is sticky
/// and every subsequent parse or decode call is a no-op that preserves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No errors.
    #[default]
    Ok,
    /// Malformed or unexpected byte sequence; aborts further parsing.
    FormatError,
    /// Source unreadable before any bytes were parsed.
    OpenError,
    /// A frame parsed but its pixel stream was truncated or corrupt;
    /// best-effort output was retained.
    PartialDecode,
}

impl Status {
    /// True for any non-`Ok` status.
    pub fn is_error(self) -> bool {
        self != Status::Ok
    }

    /// True only for `Ok`.
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// True for the sticky statuses that terminate a session.
    ///
    /// `PartialDecode` is per-step: later frames may still decode.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::FormatError | Status::OpenError)
    }
}

/// Main error type for the gifwall engine.
///
/// Used for API misuse and I/O at the edges; malformed GIF input is
/// reported via [`Status`], not via this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed data where a hard error is appropriate.
    #[error("Format error: {0}")]
    Format(String),

    /// Source could not be opened or read.
    #[error("Open error: {0}")]
    Open(String),

    /// Read past the end of the source buffer.
    #[error("Truncated data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        /// Bytes required to satisfy the read.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Check if this error indicates a truncated source.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::TruncatedData { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flags() {
        assert!(Status::Ok.is_ok());
        assert!(!Status::Ok.is_error());
        assert!(Status::FormatError.is_error());
        assert!(Status::FormatError.is_terminal());
        assert!(Status::OpenError.is_terminal());
        assert!(!Status::PartialDecode.is_terminal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::TruncatedData {
            expected: 13,
            actual: 6,
        };
        assert_eq!(err.to_string(), "Truncated data: expected 13 bytes, got 6");
        assert!(err.is_truncation());
    }
}
