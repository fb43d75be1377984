pub mod paths;
pub mod storage;
pub mod studio_repository;
pub mod uploads;

pub use crate::paths::StudioPaths;
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore, PersistentStore, SaveOutcome};
pub use crate::studio_repository::StoreBackedRepository;
