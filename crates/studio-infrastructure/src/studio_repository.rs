//! [`StudioRepository`] backed by a [`KeyValueStore`].
//!
//! Each collection lives under its own key and is validated independently on
//! load, so a corrupt value only resets that one collection.

use studio_core::image::StoredImage;
use studio_core::model::{CustomUploadSet, HistoryItem, ItemType};
use studio_core::state::{sanitize, StudioRepository};

use crate::storage::{KeyValueStore, PersistentStore, SaveOutcome};

pub const HISTORY_KEY: &str = "ai-style-studio-history";
pub const CUSTOM_CLOTHES_KEY: &str = "ai-style-studio-custom-clothes";
pub const CUSTOM_ACCESSORIES_KEY: &str = "ai-style-studio-custom-accessories";
pub const CUSTOM_UPLOADS_KEY: &str = "ai-style-studio-custom-uploads";

/// Key holding the custom library for `item_type`.
pub fn custom_items_key(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Clothing => CUSTOM_CLOTHES_KEY,
        ItemType::Accessory => CUSTOM_ACCESSORIES_KEY,
    }
}

pub struct StoreBackedRepository<S> {
    store: PersistentStore<S>,
}

impl<S: KeyValueStore> StoreBackedRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: PersistentStore::new(store),
        }
    }

    pub fn store(&self) -> &PersistentStore<S> {
        &self.store
    }

    fn report(&self, key: &str, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Written => tracing::trace!("[StoreBackedRepository] Saved '{}'", key),
            SaveOutcome::Trimmed { kept } => {
                tracing::info!("[StoreBackedRepository] Saved '{}' trimmed to {} entries", key, kept)
            }
            SaveOutcome::Abandoned => {
                tracing::warn!("[StoreBackedRepository] '{}' was not saved", key)
            }
        }
    }
}

impl<S: KeyValueStore> StudioRepository for StoreBackedRepository<S> {
    fn load_history(&self) -> Vec<HistoryItem> {
        self.store
            .load_value(HISTORY_KEY)
            .map(|value| sanitize::history(&value))
            .unwrap_or_default()
    }

    fn save_history(&self, history: &[HistoryItem]) {
        let outcome = self.store.save(HISTORY_KEY, history);
        self.report(HISTORY_KEY, outcome);
    }

    fn load_custom_items(&self, item_type: ItemType) -> Vec<StoredImage> {
        self.store
            .load_value(custom_items_key(item_type))
            .map(|value| sanitize::image_list(&value))
            .unwrap_or_default()
    }

    fn save_custom_items(&self, item_type: ItemType, items: &[StoredImage]) {
        let key = custom_items_key(item_type);
        let outcome = self.store.save(key, items);
        self.report(key, outcome);
    }

    fn load_custom_uploads(&self) -> CustomUploadSet {
        self.store
            .load_value(CUSTOM_UPLOADS_KEY)
            .map(|value| sanitize::upload_set(&value))
            .unwrap_or_default()
    }

    fn save_custom_uploads(&self, uploads: &CustomUploadSet) {
        let outcome = self.store.save(CUSTOM_UPLOADS_KEY, uploads);
        self.report(CUSTOM_UPLOADS_KEY, outcome);
    }
}
