use serde::{Deserialize, Serialize};

/// Events not tied to a download or an artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// A step failed without failing the operation, e.g. cleanup of a
    /// downloaded archive after the directory validated
    Warning {
        message: String,
        context: Option<String>,
    },
}

impl GeneralEvent {
    #[must_use]
    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }
}
