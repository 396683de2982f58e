use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub crm: CrmConfig,
    #[serde(default)]
    pub portal: PortalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrmConfig {
    /// Base URL of the CRM REST API, e.g. `https://crm.example.com/api/v1.0`
    pub endpoint: String,
    /// Plugin/app key sent as `X-Auth-App-Key`
    pub app_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PortalConfig {
    /// Show raw CRM errors and a step trace on the public form
    #[serde(default)]
    pub debug: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&config_str)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(config_str: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(config_str)?;
        Ok(config)
    }
}
