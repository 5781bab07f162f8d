use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wings_connections::ConnectionConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "WINGS_CONFIG";

/// Config file picked up from the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "wings.toml";

/// Top-level `wings.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WingsConfig {
    pub connections: ConnectionConfig,

    /// Language model endpoint; semantic scoring is off without it
    pub llm: Option<LlmConfig>,
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,

    /// Environment variable holding the API key. Unset means no auth header.
    pub api_key_env: String,

    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        reqwest::Url::parse(&self.endpoint)
            .map_err(|e| format!("llm.endpoint {:?} is not a URL: {e}", self.endpoint))?;
        if self.model.trim().is_empty() {
            return Err("llm.model is empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("llm.timeout_secs must be > 0".to_string());
        }
        Ok(())
    }

    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl WingsConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Invalid config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.connections
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [connections] config: {e}"))?;
        if let Some(llm) = &self.llm {
            llm.validate()
                .map_err(|e| anyhow::anyhow!("Invalid [llm] config: {e}"))?;
        }
        Ok(())
    }

    /// Resolve and load the config file.
    ///
    /// Lookup order: `explicit`, then `$WINGS_CONFIG`, then `./wings.toml`.
    /// An explicitly named file must exist; a missing `./wings.toml` just
    /// means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_path(explicit) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                let config = Self::from_toml_str(&raw)
                    .with_context(|| format!("Failed to load config {}", path.display()))?;
                log::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            None => {
                log::debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }
}

fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
    fallback.is_file().then_some(fallback)
}
