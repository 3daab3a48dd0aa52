//! Run settings: built-in defaults, an optional TOML file, then environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use rxmap_core::PipelineSettings;
use rxmap_llm::OpenAiSettings;
use rxmap_rxnorm::RxNavSettings;

/// Value shipped in the sample `.env`; treated as unset.
pub const API_KEY_PLACEHOLDER: &str = "your_openai_api_key_here";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_RXNORM_BASE_URL: &str = "RXNORM_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub rxnorm: RxNavSettings,
    pub pipeline: PipelineSettings,
    pub output: OutputSettings,
    pub input: InputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    /// File name prefix before the timestamp.
    pub prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            prefix: "rxnorm_mapping".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub file: PathBuf,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("refdesmedicamentscnops.xlsx"),
        }
    }
}

impl Settings {
    /// Parse a TOML settings document. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse settings")
    }

    /// Load defaults, overlay `path` when given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("read settings {}", path.display()))?;
                let settings = Self::from_toml(&content)
                    .with_context(|| format!("in {}", path.display()))?;
                tracing::info!(path = %path.display(), "loaded settings");
                settings
            }
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Override service URLs from environment variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_empty(ENV_OPENAI_BASE_URL) {
            self.openai.base_url = url;
        }
        if let Some(url) = non_empty(ENV_RXNORM_BASE_URL) {
            self.rxnorm.base_url = url;
        }
    }
}

/// The completion API key, rejecting a missing or placeholder value.
pub fn api_key(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    match lookup(ENV_API_KEY).map(|key| key.trim().to_string()) {
        Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER => Ok(key),
        _ => bail!("{ENV_API_KEY} not found in environment variables; set it in the .env file"),
    }
}
