//! Readiness checks for local model directories

use modelsync_config::{ValidationConfig, DEFAULT_REQUIRED_FILE};
use modelsync_errors::{ConfigError, Error, ValidationError};
use std::path::{Component, Path};
use tokio::fs;

/// Ordered list of files a ready directory must contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyManifest {
    required: Vec<String>,
}

impl Default for ReadyManifest {
    fn default() -> Self {
        Self {
            required: vec![DEFAULT_REQUIRED_FILE.to_string()],
        }
    }
}

impl ReadyManifest {
    /// Build a manifest from relative file names
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or a name is absolute or
    /// climbs out of the directory.
    pub fn new<I, S>(files: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let required: Vec<String> = files.into_iter().map(Into::into).collect();
        if required.is_empty() {
            return Err(ConfigError::Invalid {
                message: "a ready manifest needs at least one required file".to_string(),
            }
            .into());
        }

        for file in &required {
            let relative = !file.is_empty()
                && Path::new(file)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
            if !relative {
                return Err(ConfigError::InvalidValue {
                    field: "validation.required_files".to_string(),
                    value: file.clone(),
                }
                .into());
            }
        }

        Ok(Self { required })
    }

    /// Manifest from the `[validation]` config section
    ///
    /// # Errors
    ///
    /// Returns an error if the configured list is not a valid manifest.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, Error> {
        Self::new(config.required_files.iter().cloned())
    }

    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.required
    }
}

/// Check that every required file exists in `dir` and is non-empty
///
/// Files are checked in manifest order and the first failure is returned.
/// A directory at a required path counts as missing. Nothing is modified.
///
/// # Errors
///
/// Returns `MissingFile` or `EmptyFile` for the first file that fails.
pub async fn check_ready(dir: &Path, manifest: &ReadyManifest) -> Result<(), ValidationError> {
    for file in manifest.files() {
        let metadata = match fs::metadata(dir.join(file)).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                return Err(ValidationError::MissingFile {
                    file: file.clone(),
                    dir: dir.display().to_string(),
                })
            }
        };

        if metadata.len() == 0 {
            return Err(ValidationError::EmptyFile {
                file: file.clone(),
                dir: dir.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Whether `dir` passes [`check_ready`]
pub async fn is_ready(dir: &Path, manifest: &ReadyManifest) -> bool {
    check_ready(dir, manifest).await.is_ok()
}
