//! Materialization error types

use std::borrow::Cow;

use crate::{UserFacingError, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum MaterializeError {
    #[error("artifact {key} is not ready after unpacking: {source}")]
    NotReady {
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("artifact key must not be empty")]
    InvalidKey,

    #[error("at least one mirror is required")]
    NoMirrors,
}

impl UserFacingError for MaterializeError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotReady { .. } => {
                Some("The distribution is corrupt or incomplete; try another mirror.")
            }
            Self::InvalidKey | Self::NoMirrors => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotReady { .. } => "materialize.not_ready",
            Self::InvalidKey => "materialize.invalid_key",
            Self::NoMirrors => "materialize.no_mirrors",
        };
        Some(code)
    }
}
