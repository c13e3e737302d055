use crate::client::ArtifactSource;
use crate::converter::{Converter, WidgetMapping};
use crate::error::ConfigError;
use crate::selector::TEXT_ENCODE_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for converting workflows and driving the generation service.
///
/// Every field has a default, so a config file only needs the values it changes.
///
/// ```toml
/// server_url = "http://gpu-box:8188"
/// max_poll_attempts = 120
///
/// [artifact_source]
/// kind = "shared_directory"
/// path = "/srv/comfy/output"
///
/// [widget_mappings]
/// MyPromptNode = ["text", "_", "seed"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the generation service.
    pub server_url: String,
    /// Editor-format workflow used as the template for every job.
    pub workflow_path: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    /// Pause between consecutive jobs of a batch.
    pub inter_job_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Operation type whose node receives the prompt text.
    pub text_encode_type: String,
    pub artifact_source: ArtifactSource,
    /// Extra positional widget mappings, operation type to input names (`"_"` skips a slot).
    pub widget_mappings: BTreeMap<String, Vec<String>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8188".to_string(),
            workflow_path: None,
            poll_interval_ms: 1000,
            max_poll_attempts: 60,
            inter_job_delay_ms: 1000,
            request_timeout_secs: 30,
            text_encode_type: TEXT_ENCODE_TYPE.to_string(),
            artifact_source: ArtifactSource::Download,
            widget_mappings: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Invalid("server_url must not be empty".to_string()));
        }
        if self.max_poll_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_poll_attempts must be at least 1".to_string(),
            ));
        }
        if self.text_encode_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "text_encode_type must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn inter_job_delay(&self) -> Duration {
        Duration::from_millis(self.inter_job_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// A converter with the stock widget table plus the configured mappings.
    pub fn converter(&self) -> Converter {
        self.widget_mappings
            .iter()
            .fold(Converter::builder(), |builder, (operation_type, names)| {
                builder.with_mapping(WidgetMapping::from_names(operation_type.as_str(), names))
            })
            .build()
    }
}
