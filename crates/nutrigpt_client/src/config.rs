use crate::GenerationError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    pub max_retries: u32,
}

impl GeminiConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, GenerationError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api = get("GEMINI_API_KEY")
            .or_else(|| get("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::Config("GEMINI_API_KEY missing".into()))?;

        let mut cfg = Self::new(SecretString::new(api.into()));
        if let Some(model) = get("NUTRIGPT_GEMINI_MODEL") {
            cfg.model = model;
        }
        if let Some(base) = get("NUTRIGPT_GEMINI_BASE_URL") {
            cfg.base_url = base;
        }
        if let Some(secs) = get("NUTRIGPT_GEMINI_TIMEOUT_SECS") {
            cfg.timeout = Duration::from_secs(parse_number("NUTRIGPT_GEMINI_TIMEOUT_SECS", &secs)?);
        }
        if let Some(retries) = get("NUTRIGPT_GEMINI_MAX_RETRIES") {
            cfg.max_retries = parse_number("NUTRIGPT_GEMINI_MAX_RETRIES", &retries)?;
        }
        Ok(cfg)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, GenerationError> {
    raw.trim()
        .parse()
        .map_err(|_| GenerationError::Config(format!("{name} must be a non-negative integer, got {raw:?}")))
}
