//! Transfer related error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while moving bytes, listing items or retiring them
#[derive(Error, Debug)]
pub enum TransferError {
    /// Copy failed part way through
    #[error("Error copying data after {written} bytes: {source}")]
    Copy {
        written: u64,
        #[source]
        source: std::io::Error,
    },

    /// The source could not enumerate its items
    #[error("Unable to list items in source '{source_name}': {source}")]
    Listing {
        source_name: String,
        #[source]
        source: Box<crate::Error>,
    },

    /// A seekable stream could not be rewound for replay
    #[error("Unable to seek to the beginning of the stream: {source}")]
    Rewind {
        #[source]
        source: std::io::Error,
    },

    /// A container held the wrong number of entries
    #[error("Expected exactly {expected} entry in the archive, but got {found}")]
    UnexpectedEntryCount { expected: usize, found: usize },

    /// A container entry was a directory where a file was expected
    #[error("Expected a file in the archive, but '{name}' is a directory")]
    DirectoryEntry { name: String },

    /// A container could not be read or written
    #[error("Malformed {format} data: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    /// The chain succeeded, but the source item could not be deleted or moved
    #[error(
        "The transfer was successful, but the source item {} could not be retired: {source}",
        path.display()
    )]
    Retirement {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sink wrote the file, but could not move it into its delivery location
    #[error(
        "The file was written to {}, but could not be moved to {}: {source}",
        from.display(),
        to.display()
    )]
    Finalize {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Create a copy failure error
    pub fn copy_failed(written: u64, source: std::io::Error) -> Self {
        Self::Copy { written, source }
    }

    /// Create a listing failure error
    pub fn listing(source_name: &str, source: impl Into<crate::Error>) -> Self {
        Self::Listing {
            source_name: source_name.to_string(),
            source: Box::new(source.into()),
        }
    }

    /// Create a rewind failure error
    pub fn rewind(source: std::io::Error) -> Self {
        Self::Rewind { source }
    }

    /// Create an unexpected entry count error
    pub fn unexpected_entry_count(expected: usize, found: usize) -> Self {
        Self::UnexpectedEntryCount { expected, found }
    }

    /// Create a directory entry error
    pub fn directory_entry(name: &str) -> Self {
        Self::DirectoryEntry {
            name: name.to_string(),
        }
    }

    /// Create a malformed container error
    pub fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            message: message.into(),
        }
    }

    /// Create a retirement failure error
    pub fn retirement(path: &Path, source: std::io::Error) -> Self {
        Self::Retirement {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a finalize failure error
    pub fn finalize(from: &Path, to: &Path, source: std::io::Error) -> Self {
        Self::Finalize {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }

    /// Check if this error may go away on a later attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::UnexpectedEntryCount { .. } | Self::DirectoryEntry { .. } | Self::Malformed { .. }
        )
    }
}
