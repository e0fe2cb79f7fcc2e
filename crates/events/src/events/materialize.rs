use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Ensure-present lifecycle events, keyed by artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterializeEvent {
    /// Fast path: the directory was already ready
    AlreadyPresent { key: String, target_dir: PathBuf },

    /// Waiting for the artifact's gate
    GateWaiting { key: String },

    /// Another caller finished the work while this one waited
    CompletedByPeer { key: String, target_dir: PathBuf },

    /// A leftover download from an earlier attempt is being reused
    ArchiveReused { key: String, archive: PathBuf },

    /// Archive download starting
    Downloading { key: String, archive: PathBuf },

    /// Archive extraction starting
    Extracting {
        key: String,
        archive: PathBuf,
        target_dir: PathBuf,
    },

    /// The directory is now ready
    Completed {
        key: String,
        target_dir: PathBuf,
        entries: usize,
    },

    /// The attempt failed; the directory is not ready
    Failed { key: String, failure: FailureContext },
}

impl MaterializeEvent {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::AlreadyPresent { key, .. }
            | Self::GateWaiting { key }
            | Self::CompletedByPeer { key, .. }
            | Self::ArchiveReused { key, .. }
            | Self::Downloading { key, .. }
            | Self::Extracting { key, .. }
            | Self::Completed { key, .. }
            | Self::Failed { key, .. } => key,
        }
    }
}
