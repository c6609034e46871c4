use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.wandb.ai";

const API_KEY_VAR: &str = "WANDB_API_KEY";
const BASE_URL_VAR: &str = "WANDB_BASE_URL";

/// Connection settings for the tracking service.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read the required credential (and optional base URL override) from
    /// the environment. A missing or empty `WANDB_API_KEY` is the one
    /// fatal startup condition the server has.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} must be set in the environment", API_KEY_VAR))
            })?;

        let mut config = Config::new(api_key);
        if let Some(base_url) = std::env::var(BASE_URL_VAR).ok().filter(|u| !u.is_empty()) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_public_api() {
        let config = Config::new("secret");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let config = config.with_base_url("https://wandb.example.com");
        assert_eq!(config.base_url, "https://wandb.example.com");
    }
}
