use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Mirror download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// A mirror is about to be requested
    MirrorAttempt {
        url: String,
        /// 1-based position of this mirror in the list
        attempt: usize,
        total: usize,
    },

    /// A mirror answered with a non-success status, errored, or timed out
    MirrorFailed {
        url: String,
        attempt: usize,
        failure: FailureContext,
    },

    /// The full body of a mirror was written to the destination
    Completed {
        url: String,
        destination: String,
        bytes: u64,
    },

    /// Every mirror failed
    Exhausted {
        destination: String,
        mirrors: Vec<String>,
    },
}

impl DownloadEvent {
    /// URL the event concerns; the primary mirror for `Exhausted`
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::MirrorAttempt { url, .. }
            | Self::MirrorFailed { url, .. }
            | Self::Completed { url, .. } => url,
            Self::Exhausted { mirrors, .. } => mirrors.first().map_or("", String::as_str),
        }
    }
}
