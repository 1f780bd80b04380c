use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::llm_client::{ProviderConfig, ProviderKind};
use crate::scoring::ScoringWeights;
use crate::workflow::{WorkflowConfig, DEFAULT_STAGE_TIMEOUT};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub weights: ScoringWeights,
    pub stage_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset and blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match get("LLM_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKind>()?,
            None => ProviderKind::Anthropic,
        };
        let api_key = require_env(&get, kind.api_key_var())?;
        let model = get("LLM_MODEL").unwrap_or_else(|| kind.default_model().to_string());

        let provider = ProviderConfig {
            kind,
            api_key,
            model,
            temperature: parse_env(&get, "LLM_TEMPERATURE", 0.4)?,
            max_tokens: parse_env(&get, "LLM_MAX_TOKENS", 4096)?,
            request_timeout: Duration::from_secs(parse_env(&get, "LLM_TIMEOUT_SECONDS", 60)?),
            max_retries: parse_env(&get, "LLM_MAX_RETRIES", 3)?,
        };

        // Checked once command-line overrides are applied.
        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            skills_weight: parse_env(&get, "SKILLS_WEIGHT", defaults.skills_weight)?,
            experience_weight: parse_env(&get, "EXPERIENCE_WEIGHT", defaults.experience_weight)?,
            culture_weight: parse_env(&get, "CULTURE_WEIGHT", defaults.culture_weight)?,
        };

        Ok(Config {
            provider,
            weights,
            stage_timeout: Duration::from_secs(parse_env(
                &get,
                "STAGE_TIMEOUT_SECONDS",
                DEFAULT_STAGE_TIMEOUT.as_secs(),
            )?),
            port: parse_env(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            weights: self.weights,
            stage_timeout: self.stage_timeout,
        }
    }
}

fn require_env(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get(key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_env<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
    }
}
