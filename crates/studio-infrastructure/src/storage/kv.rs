//! Synchronous key-value string store.

/// Errors that can occur during key-value store operations.
#[derive(Debug)]
pub enum StoreError {
    /// The write would exceed the store's byte quota.
    QuotaExceeded {
        key: String,
        required: u64,
        limit: u64,
    },
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization error.
    SerializeError(serde_json::Error),
    /// File locking or mutex error.
    LockError(String),
    /// The key cannot be used as a storage name.
    InvalidKey(String),
}

impl StoreError {
    /// Whether this failure means the store ran out of room.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::QuotaExceeded {
                key,
                required,
                limit,
            } => write!(
                f,
                "Quota exceeded writing '{}': {} bytes required, limit {}",
                key, required, limit
            ),
            StoreError::IoError(e) => write!(f, "I/O error: {}", e),
            StoreError::SerializeError(e) => write!(f, "JSON serialization error: {}", e),
            StoreError::LockError(e) => write!(f, "Lock error: {}", e),
            StoreError::InvalidKey(key) => write!(f, "Invalid storage key: '{}'", key),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::IoError(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializeError(e)
    }
}

/// A synchronous string store addressed by key, with a capacity limit.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`; removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
