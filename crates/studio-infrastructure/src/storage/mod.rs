//! Storage layer: key-value stores, quota-tolerant JSON persistence and
//! configuration files.

mod config_storage;
mod file_store;
mod kv;
mod memory_store;
mod persistent_store;
mod secret_storage;

pub use config_storage::{ConfigStorage, ConfigStorageError};
pub use file_store::FileStore;
pub use kv::{KeyValueStore, StoreError};
pub use memory_store::MemoryStore;
pub use persistent_store::{trimmed_len, PersistentStore, SaveOutcome};
pub use secret_storage::{ApiCredential, SecretStorage, SecretStorageError, API_KEY_ENV_VARS};
