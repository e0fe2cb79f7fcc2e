//! Readiness validation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{file} not found in {dir}, model error?")]
    MissingFile { file: String, dir: String },

    #[error("{file} invalid(length = 0) in {dir}, model error?")]
    EmptyFile { file: String, dir: String },
}

impl ValidationError {
    /// Name of the required file that failed the check
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::MissingFile { file, .. } | Self::EmptyFile { file, .. } => file,
        }
    }
}

impl UserFacingError for ValidationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("The artifact is incomplete; run the ensure operation again.")
    }

    fn is_retryable(&self) -> bool {
        true
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::MissingFile { .. } => Some("validation.missing_file"),
            Self::EmptyFile { .. } => Some("validation.empty_file"),
        }
    }
}
