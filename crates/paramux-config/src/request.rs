//! Install requests stored as TOML.

use std::path::Path;

use paramux_core::{DEFAULT_STEP_DELAY, InstallRequest, RemainderPolicy, RetentionOption};
use serde::{Deserialize, Serialize};

use crate::ConfigError;
use crate::paths;

fn default_step_delay() -> f32 {
    DEFAULT_STEP_DELAY
}

/// On-disk form of an [`InstallRequest`].
///
/// # TOML Format
///
/// ```toml
/// name = "Outfit"
/// parameters = ["Hat", "Coat", "Hue"]
/// bipolar = ["Hue"]
/// steps = 2
/// step_delay = 0.2
/// change_detection = true
/// retention = "auto"
/// remainder = "distribute"
/// ```
///
/// Only `parameters` and `steps` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRequestFile {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parameters to multiplex, in allocation order.
    pub parameters: Vec<String>,
    /// Float parameters with a `[-1, 1]` range.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bipolar: Vec<String>,
    /// Number of synchronization steps.
    pub steps: usize,
    /// Seconds each step stays live.
    #[serde(default = "default_step_delay")]
    pub step_delay: f32,
    /// Build the change-detection pipeline.
    #[serde(default)]
    pub change_detection: bool,
    /// Default-value retention option.
    #[serde(default)]
    pub retention: RetentionOption,
    /// How uneven parameter counts are handled.
    #[serde(default)]
    pub remainder: RemainderPolicy,
    /// Asset storage path; the user config directory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl InstallRequestFile {
    /// Load a request from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let request = Self::from_toml(&content)?;
        tracing::debug!(
            "loaded request {} ({} parameters)",
            path.display(),
            request.parameters.len()
        );
        Ok(request)
    }

    /// Load a request by file path or saved request name.
    pub fn find(name: &str) -> Result<Self, ConfigError> {
        let path =
            paths::find_request(name).ok_or_else(|| ConfigError::RequestNotFound(name.into()))?;
        Self::load(path)
    }

    /// Parse a request from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the request to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize the request to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Converts to the in-memory request.
    pub fn to_request(&self) -> InstallRequest {
        let storage = self
            .storage_path
            .clone()
            .unwrap_or_else(paths::default_storage_dir);
        InstallRequest::new(self.parameters.iter().cloned(), self.steps)
            .with_bipolar(self.bipolar.iter().cloned())
            .with_step_delay(self.step_delay)
            .with_change_detection(self.change_detection)
            .with_retention(self.retention)
            .with_remainder(self.remainder)
            .with_storage_path(storage)
    }
}

impl From<&InstallRequest> for InstallRequestFile {
    fn from(request: &InstallRequest) -> Self {
        Self {
            name: None,
            parameters: request.parameters.clone(),
            bipolar: request.bipolar.clone(),
            steps: request.step_count,
            step_delay: request.step_delay,
            change_detection: request.change_detection,
            retention: request.retention,
            remainder: request.remainder,
            storage_path: (!request.storage_path.is_empty()).then(|| request.storage_path.clone()),
        }
    }
}
