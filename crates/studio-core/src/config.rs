//! Configuration models.
//!
//! `StudioConfig` mirrors `config.toml`; `SecretConfig` mirrors `secret.json`.
//! Every field is optional so a partial or missing file falls back to defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Browsers typically allow about 5 MiB of local storage per origin.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl GenerationConfig {
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn base_url_or_default(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Byte quota of the key-value store.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
    /// Directory of the key-value store; defaults to the platform data dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl StorageConfig {
    pub fn quota_or_default(&self) -> u64 {
        self.quota_bytes.unwrap_or(DEFAULT_QUOTA_BYTES)
    }
}

/// Secrets loaded from `secret.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: StudioConfig = toml::from_str(
            r#"
            [storage]
            quota_bytes = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.quota_or_default(), 1024);
        assert_eq!(config.generation.model_or_default(), DEFAULT_IMAGE_MODEL);
        assert_eq!(config.generation.base_url_or_default(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: StudioConfig = toml::from_str("").unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.storage.quota_or_default(), DEFAULT_QUOTA_BYTES);
    }
}
