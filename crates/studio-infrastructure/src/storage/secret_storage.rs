//! Secret configuration file storage.
//!
//! Loads `secret.json` and resolves the Gemini API key, with environment
//! variables taking precedence over the file.

use crate::paths::StudioPaths;
use studio_core::config::SecretConfig;
use std::fs;
use std::path::PathBuf;

/// Environment variables checked for an API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// Configuration file not found.
    NotFound(PathBuf),
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::NotFound(path) => {
                write!(f, "Secret file not found at: {}", path.display())
            }
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
            SecretStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

/// A resolved Gemini credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredential {
    pub api_key: String,
    /// Model override from `secret.json`, if any.
    pub model_name: Option<String>,
}

/// Read-only access to `secret.json`.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Uses the default path (`~/.config/style-studio/secret.json`).
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = StudioPaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Resolves the API key from the environment, then from this file.
    pub fn resolve_api_key(&self) -> Option<ApiCredential> {
        let from_env = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty());
        self.resolve_with(from_env)
    }

    fn resolve_with(&self, env_key: Option<String>) -> Option<ApiCredential> {
        let gemini = match self.load() {
            Ok(config) => config.gemini,
            Err(SecretStorageError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!("[SecretStorage] Ignoring {}: {}", self.path.display(), e);
                None
            }
        };
        let model_name = gemini.as_ref().and_then(|g| g.model_name.clone());

        if let Some(api_key) = env_key {
            return Some(ApiCredential {
                api_key,
                model_name,
            });
        }

        gemini
            .filter(|g| !g.api_key.trim().is_empty())
            .map(|g| ApiCredential {
                api_key: g.api_key,
                model_name,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(file_path.clone());

        match storage.load() {
            Err(SecretStorageError::NotFound(path)) => assert_eq!(path, file_path),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_valid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(
            &file_path,
            r#"{ "gemini": { "api_key": "test-key-123", "model_name": "gemini-test" } }"#,
        )
        .unwrap();

        let storage = SecretStorage::with_path(file_path);
        let gemini = storage.load().unwrap().gemini.unwrap();
        assert_eq!(gemini.api_key, "test-key-123");
        assert_eq!(gemini.model_name.as_deref(), Some("gemini-test"));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, "{ invalid json").unwrap();

        let storage = SecretStorage::with_path(file_path);
        assert!(matches!(storage.load(), Err(SecretStorageError::ParseError(_))));
    }

    #[test]
    fn test_env_key_wins_over_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(
            &file_path,
            r#"{ "gemini": { "api_key": "file-key", "model_name": "m" } }"#,
        )
        .unwrap();
        let storage = SecretStorage::with_path(file_path);

        let credential = storage.resolve_with(Some("env-key".to_string())).unwrap();
        assert_eq!(credential.api_key, "env-key");
        assert_eq!(credential.model_name.as_deref(), Some("m"));

        let credential = storage.resolve_with(None).unwrap();
        assert_eq!(credential.api_key, "file-key");
    }

    #[test]
    fn test_no_key_anywhere() {
        let temp_dir = TempDir::new().unwrap();
        let storage = SecretStorage::with_path(temp_dir.path().join("secret.json"));
        assert!(storage.resolve_with(None).is_none());

        fs::write(storage.path(), r#"{ "gemini": { "api_key": "  " } }"#).unwrap();
        assert!(storage.resolve_with(None).is_none());
    }
}
