use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CONFIG_SCHEMA: &str = include_str!("../posthog-provider.schema.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Unset values are resolved by `provider::Provider::configure`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_logging_filter(),
            dir: None,
            rotation: default_logging_rotation(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::from_json5(&config_content)
            .with_context(|| format!("failed to load {}", config_path.display()))
    }

    pub fn from_json5(content: &str) -> Result<Self> {
        let config_value: Value = json5::from_str(content).context("failed to parse config")?;
        validate_against_schema(&config_value)?;
        serde_json::from_value(config_value).context("failed to deserialize config")
    }
}

fn validate_against_schema(config_value: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(CONFIG_SCHEMA).context("failed to parse embedded config schema")?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
