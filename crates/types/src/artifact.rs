//! Artifact identity

use modelsync_errors::{Error, MaterializeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a model
///
/// Used only as the locking granularity. Never derive paths from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Create a key from a non-empty name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MaterializeError::InvalidKey.into());
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ArtifactKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_keys() {
        assert!(ArtifactKey::new("").is_err());
        assert!(ArtifactKey::new("   ").is_err());
        assert_eq!(ArtifactKey::new("ch_PP-OCRv4_det").unwrap().as_str(), "ch_PP-OCRv4_det");
    }

    #[test]
    fn test_serde_validates() {
        let key: ArtifactKey = serde_json::from_str(r#""det""#).unwrap();
        assert_eq!(key.to_string(), "det");
        assert!(serde_json::from_str::<ArtifactKey>(r#""""#).is_err());
    }
}
