//! CLI error handling

use std::fmt;

use modelsync_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Library operation error
    Ops(modelsync_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// Interrupted by the user
    Interrupted,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Ops(e) => Some(e),
            _ => None,
        }
    }
}

impl From<modelsync_errors::Error> for CliError {
    fn from(e: modelsync_errors::Error) -> Self {
        if e.is_cancelled() {
            CliError::Interrupted
        } else {
            CliError::Ops(e)
        }
    }
}

impl From<modelsync_errors::ValidationError> for CliError {
    fn from(e: modelsync_errors::ValidationError) -> Self {
        CliError::Ops(e.into())
    }
}
