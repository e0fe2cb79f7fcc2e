//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum NetworkError {
    #[error("failed to download {destination} from all mirrors: {}", .mirrors.join(", "))]
    FetchFailed {
        destination: String,
        mirrors: Vec<String>,
    },

    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::FetchFailed { .. } => {
                Some("Check network connectivity or add another mirror, then retry.")
            }
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("The mirror did not respond in time; retry later.")
            }
            Self::InvalidUrl(_) | Self::UnsupportedProtocol { .. } => {
                Some("Mirrors must be absolute http:// or https:// URLs.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidUrl(_) | Self::UnsupportedProtocol { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::FetchFailed { .. } => "network.fetch_failed",
            Self::Timeout { .. } => "network.timeout",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::UnsupportedProtocol { .. } => "network.unsupported_protocol",
            Self::HttpError { .. } => "network.http_error",
        };
        Some(code)
    }
}
