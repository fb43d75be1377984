//! Repository seam between the state container and persistent storage.

use std::sync::Mutex;

use crate::image::StoredImage;
use crate::model::{CustomUploadSet, HistoryItem, ItemType};

/// Load/save access to the four persisted collections.
///
/// Loads never fail: missing or malformed data yields an empty collection.
/// Saves never fail: storage problems are handled (and logged) by the
/// implementation.
pub trait StudioRepository: Send {
    fn load_history(&self) -> Vec<HistoryItem>;

    fn save_history(&self, history: &[HistoryItem]);

    fn load_custom_items(&self, item_type: ItemType) -> Vec<StoredImage>;

    fn save_custom_items(&self, item_type: ItemType, items: &[StoredImage]);

    fn load_custom_uploads(&self) -> CustomUploadSet;

    fn save_custom_uploads(&self, uploads: &CustomUploadSet);
}

#[derive(Debug, Default, Clone)]
struct Collections {
    history: Vec<HistoryItem>,
    clothing: Vec<StoredImage>,
    accessories: Vec<StoredImage>,
    uploads: CustomUploadSet,
    saves: usize,
}

/// Repository kept entirely in memory. Useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryStudioRepository {
    inner: Mutex<Collections>,
}

impl InMemoryStudioRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save calls received so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        // A poisoned lock only means a test panicked mid-save; the data is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StudioRepository for InMemoryStudioRepository {
    fn load_history(&self) -> Vec<HistoryItem> {
        self.lock().history.clone()
    }

    fn save_history(&self, history: &[HistoryItem]) {
        let mut inner = self.lock();
        inner.history = history.to_vec();
        inner.saves += 1;
    }

    fn load_custom_items(&self, item_type: ItemType) -> Vec<StoredImage> {
        let inner = self.lock();
        match item_type {
            ItemType::Clothing => inner.clothing.clone(),
            ItemType::Accessory => inner.accessories.clone(),
        }
    }

    fn save_custom_items(&self, item_type: ItemType, items: &[StoredImage]) {
        let mut inner = self.lock();
        match item_type {
            ItemType::Clothing => inner.clothing = items.to_vec(),
            ItemType::Accessory => inner.accessories = items.to_vec(),
        }
        inner.saves += 1;
    }

    fn load_custom_uploads(&self) -> CustomUploadSet {
        self.lock().uploads.clone()
    }

    fn save_custom_uploads(&self, uploads: &CustomUploadSet) {
        let mut inner = self.lock();
        inner.uploads = uploads.clone();
        inner.saves += 1;
    }
}

impl<R: StudioRepository + Sync> StudioRepository for std::sync::Arc<R> {
    fn load_history(&self) -> Vec<HistoryItem> {
        (**self).load_history()
    }

    fn save_history(&self, history: &[HistoryItem]) {
        (**self).save_history(history)
    }

    fn load_custom_items(&self, item_type: ItemType) -> Vec<StoredImage> {
        (**self).load_custom_items(item_type)
    }

    fn save_custom_items(&self, item_type: ItemType, items: &[StoredImage]) {
        (**self).save_custom_items(item_type, items)
    }

    fn load_custom_uploads(&self) -> CustomUploadSet {
        (**self).load_custom_uploads()
    }

    fn save_custom_uploads(&self, uploads: &CustomUploadSet) {
        (**self).save_custom_uploads(uploads)
    }
}
