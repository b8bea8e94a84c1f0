//! Run configuration loaded from a TOML file.
//!
//! Every field is optional. API keys are never read from the file, only from
//! the environment variable named by `summary.api_key_env`.
use crate::error::ResultMessage;
use crate::error::RustyTrendsError;
use crate::summary::SummaryError;
use crate::tables::metrics::MetricConfig;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SHEET: &str = "Traffic-Status";
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "tngtech/deepseek-r1t2-chimera:free";
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Worksheet holding the tables
    pub sheet: String,
    pub metrics: MetricConfig,
    pub summary: SummaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sheet: DEFAULT_SHEET.to_owned(),
            metrics: MetricConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, RustyTrendsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Config, RustyTrendsError> {
        let name = path.display().to_string();
        std::fs::read_to_string(path)
            .map_err(RustyTrendsError::from)
            .and_then(|text| Config::from_toml(&text))
            .with_prefix(&name)
    }
}

/// Settings of the chat-completions service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    /// Run the summary pass at all
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key_env: DEFAULT_API_KEY_ENV.to_owned(),
            timeout_secs: 60,
            max_tokens: 700,
            temperature: 0.3,
        }
    }
}

impl SummaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the API key from the configured environment variable; blank counts as missing.
    pub fn api_key(&self) -> Result<String, SummaryError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SummaryError::MissingKey(self.api_key_env.to_owned()))
    }
}
