//! Error types for the jsonmemo application.
//!
//! This module defines custom error types that categorize the failures that
//! can occur while validating, storing and querying notes.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Rejection reasons produced by the record validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title was missing or only whitespace.
    #[error("a title is required")]
    EmptyTitle,

    /// Title is longer than the configured limit.
    #[error("title is too long ({len} characters); the limit is {max}")]
    TitleTooLong { len: usize, max: usize },

    /// Body is longer than the configured limit.
    #[error("body is too long ({len} characters); the limit is {max}")]
    BodyTooLong { len: usize, max: usize },
}

impl ValidationError {
    pub fn hint(&self) -> &'static str {
        match self {
            ValidationError::EmptyTitle => "enter at least one non-whitespace character",
            ValidationError::TitleTooLong { .. } => "shorten the title",
            ValidationError::BodyTooLong { .. } => "shorten the body or split it into two notes",
        }
    }
}

/// Category of a failed save, derived from the underlying I/O error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    PermissionDenied,
    MissingDirectory,
    Unexpected,
}

impl WriteFailure {
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => WriteFailure::PermissionDenied,
            io::ErrorKind::NotFound => WriteFailure::MissingDirectory,
            _ => WriteFailure::Unexpected,
        }
    }
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailure::PermissionDenied => f.write_str("permission denied"),
            WriteFailure::MissingDirectory => f.write_str("directory does not exist"),
            WriteFailure::Unexpected => f.write_str("unexpected I/O error"),
        }
    }
}

/// The main error type for the jsonmemo application.
#[derive(Error, Debug)]
pub enum MemoError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors raised while writing a CSV export.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A title or body was rejected before reaching the store.
    #[error("Invalid note: {0}")]
    Validation(#[from] ValidationError),

    /// Note was not found when performing an operation.
    #[error("Note not found: #{id}")]
    NoteNotFound { id: u64 },

    /// Update was requested without any field to change.
    #[error("Nothing to update")]
    NothingToUpdate,

    /// The highest id in the store is already `u64::MAX`.
    #[error("No note id left: the highest id is {}", u64::MAX)]
    IdsExhausted,

    /// The store file exists but could not be read back, so writing would
    /// replace data we never saw.
    #[error("Refusing to write {path}: {reason}")]
    StoreNotWritable { path: PathBuf, reason: String },

    /// Saving the collection failed.
    #[error("Failed to save {path} ({kind}): {source}")]
    StorageWrite {
        kind: WriteFailure,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The web server could not start or stopped with an error.
    #[error("Server error: {message}")]
    Server { message: String },
}

impl MemoError {
    /// Remediation text shown under the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            MemoError::Validation(e) => Some(e.hint()),
            MemoError::NoteNotFound { .. } => Some("run `list` to see the existing ids"),
            MemoError::NothingToUpdate => Some("pass --title and/or --body"),
            MemoError::IdsExhausted => Some("renumber the ids in the notes file by hand"),
            MemoError::StoreNotWritable { .. } => {
                Some("restore the notes file from a backup or repair the JSON by hand")
            }
            MemoError::StorageWrite { kind, .. } => Some(match kind {
                WriteFailure::PermissionDenied => {
                    "check the permissions of the notes file and its directory"
                }
                WriteFailure::MissingDirectory => {
                    "check that the directory of the notes file exists"
                }
                WriteFailure::Unexpected => "retry; if it keeps failing check free disk space",
            }),
            MemoError::ConfigError { .. } => Some("check the --config file"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_failure_is_categorized_from_io_kind() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        let other = io::Error::new(io::ErrorKind::Other, "disk on fire");

        assert_eq!(WriteFailure::from_io(&denied), WriteFailure::PermissionDenied);
        assert_eq!(WriteFailure::from_io(&missing), WriteFailure::MissingDirectory);
        assert_eq!(WriteFailure::from_io(&other), WriteFailure::Unexpected);
    }

    #[test]
    fn title_too_long_reports_length_and_limit() {
        let err = ValidationError::TitleTooLong { len: 101, max: 100 };
        let msg = err.to_string();
        assert!(msg.contains("101"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn every_user_facing_failure_has_a_hint() {
        assert!(MemoError::NoteNotFound { id: 3 }.hint().is_some());
        assert!(MemoError::NothingToUpdate.hint().is_some());
        assert!(MemoError::from(ValidationError::EmptyTitle).hint().is_some());
    }
}
