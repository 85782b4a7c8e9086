//! Configuration file support for Heal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/heal/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub patient: PatientConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which patient record commands act on when none is given
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientConfig {
    #[serde(default = "default_patient_id")]
    pub default_id: String,
}

impl Default for PatientConfig {
    fn default() -> Self {
        Self {
            default_id: default_patient_id(),
        }
    }
}

/// Responder selection for safe assistant messages
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local keyword templates, no network
    #[default]
    Template,
    /// Any OpenAI-compatible chat completions endpoint
    OpenaiCompatible,
}

/// Recovery assistant configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("heal")
}

fn default_patient_id() -> String {
    "me".into()
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}

fn default_model() -> String {
    "llama3.1:8b".into()
}

fn default_api_key_env() -> String {
    "HEAL_LLM_API_KEY".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("heal").join("config.toml")
    }

    /// Reject values that would make the assistant unusable
    pub fn validate(&self) -> Result<()> {
        if self.assistant.timeout_secs == 0 {
            return Err(Error::Config("assistant.timeout_secs must be positive".into()));
        }
        if self.assistant.provider == ProviderKind::OpenaiCompatible
            && self.assistant.base_url.trim().is_empty()
        {
            return Err(Error::Config(
                "assistant.base_url is required for the openai_compatible provider".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
