//! Library error type.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for implmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Parsing errors
    #[error("Parse error in {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Malformed serialized input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every discovered extraction unit failed
    #[error("No package could be extracted ({attempted} attempted)")]
    NoUnitsExtracted { attempted: usize },

    /// The run was cancelled between extraction units
    #[error("Analysis cancelled")]
    Cancelled,

    /// The external analyzer executable could not be located
    #[error("Toolchain unavailable: {0}")]
    ToolchainUnavailable(String),

    /// The external analyzer ran but failed
    #[error("External analyzer failed (status {status}): {stderr}")]
    ToolFailed { status: i32, stderr: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Directory walk errors
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a file system error wrapping the underlying I/O failure
    pub fn file_system_with_source(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    /// Create a parse error with location
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("internal/shapes/circle.go", 12, "syntax error");
        assert_eq!(
            err.to_string(),
            "Parse error in internal/shapes/circle.go:12: syntax error"
        );
    }

    #[test]
    fn test_file_system_error_keeps_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::file_system_with_source("failed to read Go source", "a.go", io);
        assert_eq!(err.to_string(), "File system error: failed to read Go source");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_no_units_message() {
        let err = Error::NoUnitsExtracted { attempted: 3 };
        assert!(err.to_string().contains("3 attempted"));
    }
}
