//! I/O related error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O error with additional context
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// What was being attempted when the error occurred
    pub operation: Option<&'static str>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// File or directory not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// Target already exists
    AlreadyExists,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a file not found error
    pub fn file_not_found(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::FileNotFound,
            path: Some(path.to_path_buf()),
            operation: None,
            source: None,
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => IoErrorKind::AlreadyExists,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            operation: None,
            source: Some(source),
        }
    }

    /// Create an I/O error for a failed operation on a path
    pub fn at(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::from_std(source)
            .with_path(path)
            .with_operation(operation)
    }

    /// Attach a path
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    /// Attach the operation that was being attempted
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    let prefix = match error.operation {
        Some(operation) => format!("Unable to {operation}"),
        None => "I/O error".to_string(),
    };

    let detail = match (&error.kind, &error.path) {
        (IoErrorKind::FileNotFound, Some(path)) => format!("file not found: {}", path.display()),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("permission denied for {}", path.display())
        }
        (IoErrorKind::AlreadyExists, Some(path)) => format!("{} already exists", path.display()),
        (_, Some(path)) => path.display().to_string(),
        (_, None) => String::new(),
    };

    match (&error.source, detail.is_empty()) {
        (Some(source), false) => format!("{prefix}: {detail}: {source}"),
        (Some(source), true) => format!("{prefix}: {source}"),
        (None, false) => format!("{prefix}: {detail}"),
        (None, true) => prefix,
    }
}
