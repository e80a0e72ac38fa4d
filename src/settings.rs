use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::azure_vision::DEFAULT_API_VERSION;

pub const DEFAULT_CONFIG_PATH: &str = "gateway.toml";

const OPENAI_KEY_PLACEHOLDER: &str = "YOUR_AZURE_OPENAI_KEY";
const SPEECH_KEY_PLACEHOLDER: &str = "YOUR_AZURE_SPEECH_KEY";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub bind_address: String,
    pub log_file: PathBuf,
    pub max_body_bytes: usize,
    pub openai_endpoint: String,
    pub openai_api_key: String,
    pub openai_deployment: String,
    pub openai_api_version: String,
    pub use_bearer: bool,
    pub speech_key: String,
    pub speech_region: String,
    pub speech_language: String,
    pub speech_endpoint: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".into(),
            log_file: PathBuf::from("log.json"),
            max_body_bytes: 20 * 1024 * 1024,
            openai_endpoint: String::new(),
            openai_api_key: String::new(),
            openai_deployment: "gpt-4o".into(),
            openai_api_version: DEFAULT_API_VERSION.into(),
            use_bearer: false,
            speech_key: String::new(),
            speech_region: "eastus".into(),
            speech_language: "en-US".into(),
            speech_endpoint: None,
        }
    }
}

/// Empty, whitespace, or the template placeholder all mean "not configured".
fn credential_present(key: &str, placeholder: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != placeholder
}

impl Settings {
    /// Load from `$GATEWAY_CONFIG` (or `gateway.toml`), then apply environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var("GATEWAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut settings = Self::load_from(Path::new(&path))?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Overlay values from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut String); 8] = [
            ("GATEWAY_BIND_ADDRESS", &mut self.bind_address),
            ("AZURE_OPENAI_ENDPOINT", &mut self.openai_endpoint),
            ("AZURE_OPENAI_API_KEY", &mut self.openai_api_key),
            ("AZURE_OPENAI_DEPLOYMENT", &mut self.openai_deployment),
            ("AZURE_OPENAI_API_VERSION", &mut self.openai_api_version),
            ("AZURE_SPEECH_KEY", &mut self.speech_key),
            ("AZURE_SPEECH_REGION", &mut self.speech_region),
            ("AZURE_SPEECH_LANGUAGE", &mut self.speech_language),
        ];
        for (key, slot) in strings {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        if let Some(value) = lookup("AZURE_SPEECH_ENDPOINT") {
            self.speech_endpoint = Some(value).filter(|v| !v.trim().is_empty());
        }
        if let Some(value) = lookup("GATEWAY_LOG_FILE") {
            self.log_file = PathBuf::from(value);
        }
        if let Some(value) = lookup("AZURE_OPENAI_USE_BEARER") {
            self.use_bearer = value
                .parse()
                .map_err(|_| SettingsError::InvalidValue {
                    key: "AZURE_OPENAI_USE_BEARER",
                    value,
                })?;
        }
        if let Some(value) = lookup("GATEWAY_MAX_BODY_BYTES") {
            self.max_body_bytes = value
                .parse()
                .map_err(|_| SettingsError::InvalidValue {
                    key: "GATEWAY_MAX_BODY_BYTES",
                    value,
                })?;
        }
        Ok(())
    }

    pub fn openai_configured(&self) -> bool {
        credential_present(&self.openai_api_key, OPENAI_KEY_PLACEHOLDER)
    }

    pub fn speech_configured(&self) -> bool {
        credential_present(&self.speech_key, SPEECH_KEY_PLACEHOLDER)
    }
}
