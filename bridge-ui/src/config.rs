use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid adapter config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{var} must be a boolean, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

/// Runtime-wide adapter settings. Component classes may override
/// `backtrace` and `reraise` for themselves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Include the error chain in hook failure reports
    pub backtrace: bool,
    /// Surface hook failures to the engine instead of swallowing them
    pub reraise: bool,
    /// Always request an update unless a `needs_update` override answers
    pub force_update: bool,
    /// Scopes searched by top-level lookup, in order. "" is the global scope.
    pub search_path: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            backtrace: true,
            reraise: false,
            force_update: false,
            search_path: vec![String::new(), "Components".to_string()],
        }
    }
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read `BRIDGE_*` variables, loading a `.env` file first if there is one
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded .env file from: {:?}", path),
            Err(e) => tracing::debug!("No .env file found: {}", e),
        }
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with("BRIDGE_"))
            .collect();
        let mut config = Self::default();

        if let Some(value) = vars.get("BRIDGE_BACKTRACE") {
            config.backtrace = parse_flag("BRIDGE_BACKTRACE", value)?;
        }
        if let Some(value) = vars.get("BRIDGE_RERAISE") {
            config.reraise = parse_flag("BRIDGE_RERAISE", value)?;
        }
        if let Some(value) = vars.get("BRIDGE_FORCE_UPDATE") {
            config.force_update = parse_flag("BRIDGE_FORCE_UPDATE", value)?;
        }
        if let Some(value) = vars.get("BRIDGE_SEARCH_PATH") {
            config.search_path = value
                .split(',')
                .map(|scope| scope.trim().trim_start_matches("::").to_string())
                .collect();
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
