//! Environment-backed application configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0125";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Search tool is only registered when a key is present.
    pub tavily_api_key: Option<String>,
    pub bind_addr: String,
    pub max_tool_iterations: usize,
}

impl AppConfig {
    /// Read configuration from the environment. Call after `.env` loading.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_MODEL),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            tavily_api_key: std::env::var("TAVILY_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            max_tool_iterations: std::env::var("MAX_TOOL_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate config values, rejecting clearly broken configurations.
    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY must be set");
        }
        if self.openai_model.trim().is_empty() {
            bail!("OPENAI_MODEL must not be empty");
        }
        if self.max_tool_iterations == 0 {
            bail!("MAX_TOOL_ITERATIONS must be > 0");
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}
