//! Error types for the Harvester core library
//!
//! Errors are grouped by where they originate, so the job loop can tell a
//! failed listing apart from a failed item, and a failed copy apart from a
//! delivery that succeeded but could not be cleaned up.

use thiserror::Error;

pub mod io;
pub mod transfer;
pub mod validation;

pub use self::io::{IoError, IoErrorKind};
pub use self::transfer::TransferError;
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Harvester core library
///
/// Errors are categorized into three main types plus a context wrapper:
/// - I/O errors: file system operations, with the path involved
/// - Validation errors: configuration and regex problems
/// - Transfer errors: failures while moving bytes or retiring items
/// - Stage errors: any of the above, tagged with the stage and item that failed
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Configuration related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transfer related errors
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A chain stage failed while handling an item
    #[error("Stage '{stage}' failed for '{item}': {source}")]
    Stage {
        stage: String,
        item: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error with the stage and item it occurred in
    pub fn stage(stage: &str, item: &str, source: impl Into<Error>) -> Self {
        Self::Stage {
            stage: stage.to_string(),
            item: item.to_string(),
            source: Box::new(source.into()),
        }
    }

    /// Strip any stage context and return the error that caused it
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether retrying the same item on a later cycle could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Validation(_) => false,
            Self::Transfer(err) => err.is_retryable(),
            Self::Stage { source, .. } => source.is_retryable(),
        }
    }

    /// Whether the artifact was delivered but a cleanup step failed afterwards
    pub fn is_retirement_failure(&self) -> bool {
        matches!(
            self.root(),
            Self::Transfer(TransferError::Retirement { .. } | TransferError::Finalize { .. })
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::path::Path;

    #[test]
    fn test_stage_error_includes_context() {
        let inner = TransferError::unexpected_entry_count(1, 0);
        let error = Error::stage("unzip", "empty.zip", inner);

        let display = error.to_string();
        assert!(display.contains("unzip"));
        assert!(display.contains("empty.zip"));
        assert!(display.contains("exactly 1"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_root_unwraps_nested_stages() {
        let inner = Error::stage(
            "gunzip",
            "a.gz",
            TransferError::copy_failed(12, std::io::Error::other("boom")),
        );
        let outer = Error::stage("split", "a.gz", inner);

        assert!(matches!(
            outer.root(),
            Error::Transfer(TransferError::Copy { written: 12, .. })
        ));
    }

    #[test]
    fn test_retryable_classification() {
        let copy = Error::from(TransferError::copy_failed(3, std::io::Error::other("reset")));
        assert!(copy.is_retryable());

        let entries = Error::stage("unzip", "x.zip", TransferError::unexpected_entry_count(1, 2));
        assert!(!entries.is_retryable());

        let regex = Error::from(ValidationError::invalid_regex("(", "unclosed group"));
        assert!(!regex.is_retryable());
    }

    #[test]
    fn test_retirement_failures_are_distinct() {
        let retire = Error::from(TransferError::retirement(
            Path::new("/in/a.txt"),
            std::io::Error::other("busy"),
        ));
        assert!(retire.is_retirement_failure());

        let finalize = Error::stage(
            "local-writer",
            "a.txt",
            TransferError::finalize(
                Path::new("/tx/a.txt"),
                Path::new("/out/a.txt"),
                std::io::Error::other("cross-device"),
            ),
        );
        assert!(finalize.is_retirement_failure());

        let copy = Error::from(TransferError::copy_failed(0, std::io::Error::other("x")));
        assert!(!copy.is_retirement_failure());
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io_error.into();

        match error {
            Error::Io(io_err) => assert_eq!(io_err.kind, IoErrorKind::FileNotFound),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
