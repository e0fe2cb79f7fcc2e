//! Archive unpacking error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("extraction of {path} failed: {message}")]
    ExtractionFailed { path: String, message: String },

    #[error("unsupported archive format: {path}")]
    UnsupportedFormat { path: String },

    #[error("single entry {entry} is not an archive")]
    NestedEntryNotArchive { entry: String },

    #[error("archive entry escapes the destination: {entry}")]
    PathTraversal { entry: String },
}

impl ArchiveError {
    /// Wrap a lower-level failure for the archive at `path`
    pub fn extraction(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ExtractionFailed {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ExtractionFailed { .. } | Self::UnsupportedFormat { .. } => Some(
                "The downloaded archive may be corrupt; delete the leftover download and retry.",
            ),
            Self::NestedEntryNotArchive { .. } => {
                Some("The mirror serves an unexpected distribution layout.")
            }
            Self::PathTraversal { .. } => Some("Refusing to unpack an untrusted archive."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ExtractionFailed { .. } => "archive.extraction_failed",
            Self::UnsupportedFormat { .. } => "archive.unsupported_format",
            Self::NestedEntryNotArchive { .. } => "archive.nested_entry_not_archive",
            Self::PathTraversal { .. } => "archive.path_traversal",
        };
        Some(code)
    }
}
