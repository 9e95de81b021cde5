use std::env;

use thiserror::Error;

use crate::model::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub catalog_path: String,
    pub gemini: GeminiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let port = match var("PORT") {
            Some(raw) => {
                let parsed = raw.trim().parse::<u16>();
                match parsed {
                    Ok(port) if port > 0 => port,
                    _ => return Err(ConfigError::InvalidPort(raw)),
                }
            }
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            catalog_path: var("CATALOG_PATH").unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string()),
            gemini: GeminiConfig {
                base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_key,
            },
        })
    }
}
