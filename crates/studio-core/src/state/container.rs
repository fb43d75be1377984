//! Domain state container.
//!
//! Owns the wizard selection, custom libraries and history for the session.
//! Every mutation flushes the affected collection through the repository
//! before returning.

use std::collections::HashSet;

use chrono::Utc;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::catalog;
use crate::error::{Result, StudioError};
use crate::image::{ImageId, ImageRef, StoredImage};
use crate::model::{CustomUploadSet, HistoryItem, ItemType, SubjectCategory};
use crate::state::repository::StudioRepository;
use crate::wizard::{WizardState, WizardStep};

pub struct StudioState<R: StudioRepository> {
    repository: R,
    wizard: WizardState,
    custom_uploads: CustomUploadSet,
    custom_clothing: Vec<StoredImage>,
    custom_accessories: Vec<StoredImage>,
    history: Vec<HistoryItem>,
}

impl<R: StudioRepository> StudioState<R> {
    /// Restores the persisted collections and starts a fresh wizard.
    pub fn load(repository: R) -> Self {
        let history = repository.load_history();
        let custom_clothing = repository.load_custom_items(ItemType::Clothing);
        let custom_accessories = repository.load_custom_items(ItemType::Accessory);
        let custom_uploads = repository.load_custom_uploads();

        tracing::debug!(
            history = history.len(),
            clothing = custom_clothing.len(),
            accessories = custom_accessories.len(),
            uploads = custom_uploads.total_len(),
            "Loaded studio state"
        );

        Self {
            repository,
            wizard: WizardState::new(),
            custom_uploads,
            custom_clothing,
            custom_accessories,
            history,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn wizard(&self) -> &WizardState {
        &self.wizard
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn find_history(&self, id: &str) -> Option<&HistoryItem> {
        self.history.iter().find(|item| item.id == id)
    }

    pub fn custom_uploads(&self, category: SubjectCategory) -> &[StoredImage] {
        self.custom_uploads.get(category)
    }

    pub fn custom_items(&self, item_type: ItemType) -> &[StoredImage] {
        match item_type {
            ItemType::Clothing => &self.custom_clothing,
            ItemType::Accessory => &self.custom_accessories,
        }
    }

    /// Selectable subjects for a category: custom uploads first, then presets.
    pub fn subjects(&self, category: SubjectCategory) -> Vec<StoredImage> {
        let mut all = self.custom_uploads(category).to_vec();
        all.extend(catalog::preset_subjects(category));
        all
    }

    /// Selectable items of a type: custom items first, then presets.
    pub fn items(&self, item_type: ItemType) -> Vec<StoredImage> {
        let mut all = self.custom_items(item_type).to_vec();
        all.extend(catalog::preset_items(item_type));
        all
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn select_category(&mut self, category: SubjectCategory) {
        self.wizard.set_category(category);
    }

    pub fn select_subject(&mut self, subject: StoredImage) {
        self.wizard.set_subject(subject);
    }

    pub fn select_item(&mut self, item: StoredImage, item_type: ItemType) {
        self.wizard.set_item(item, item_type);
    }

    /// Selects a subject of the current category by id.
    pub fn select_subject_by_id(&mut self, id: &ImageId) -> Result<StoredImage> {
        let category = self.wizard.selected_category();
        let subject = self
            .subjects(category)
            .into_iter()
            .find(|image| &image.id == id)
            .ok_or_else(|| StudioError::not_found("subject", id.as_str()))?;
        self.wizard.set_subject(subject.clone());
        Ok(subject)
    }

    /// Selects a clothing item or accessory by id, returning its type.
    pub fn select_item_by_id(&mut self, id: &ImageId) -> Result<ItemType> {
        for item_type in ItemType::iter() {
            if let Some(item) = self.items(item_type).into_iter().find(|image| &image.id == id) {
                self.wizard.set_item(item, item_type);
                return Ok(item_type);
            }
        }
        Err(StudioError::not_found("item", id.as_str()))
    }

    // ------------------------------------------------------------------
    // Wizard transitions
    // ------------------------------------------------------------------

    pub fn advance(&mut self) -> Result<WizardStep> {
        Ok(self.wizard.advance()?)
    }

    pub fn back(&mut self) -> Result<WizardStep> {
        Ok(self.wizard.back()?)
    }

    pub fn reset(&mut self) {
        self.wizard.reset();
    }

    /// Shows a history record on the result step, restoring its selection.
    pub fn restore_history(&mut self, id: &str) -> Result<HistoryItem> {
        let record = self
            .find_history(id)
            .cloned()
            .ok_or_else(|| StudioError::not_found("history item", id))?;

        let subject = self.known_image(&record.subject_image);
        let item = self.known_image(&record.item_image);
        self.wizard.restore(subject, item, &record);
        Ok(record)
    }

    // Reuses the id of a library image with the same source so that deleting
    // it later still clears the restored selection.
    fn known_image(&self, source: &ImageRef) -> StoredImage {
        let subjects = SubjectCategory::iter().flat_map(|category| self.subjects(category));
        let items = ItemType::iter().flat_map(|item_type| self.items(item_type));
        subjects
            .chain(items)
            .find(|image| &image.source == source)
            .unwrap_or_else(|| StoredImage::from_legacy(source.clone()))
    }

    // ------------------------------------------------------------------
    // Custom uploads
    // ------------------------------------------------------------------

    pub fn add_custom_upload(&mut self, category: SubjectCategory, source: ImageRef) -> StoredImage {
        let image = StoredImage::new(source);
        self.custom_uploads.get_mut(category).insert(0, image.clone());
        self.flush_uploads();
        image
    }

    pub fn delete_custom_upload(&mut self, category: SubjectCategory, id: &ImageId) -> usize {
        self.delete_custom_uploads(category, std::slice::from_ref(id))
    }

    /// Removes every listed id from the category; returns how many were removed.
    pub fn delete_custom_uploads(&mut self, category: SubjectCategory, ids: &[ImageId]) -> usize {
        let doomed: HashSet<&ImageId> = ids.iter().collect();
        let uploads = self.custom_uploads.get_mut(category);
        let before = uploads.len();
        uploads.retain(|image| !doomed.contains(&image.id));
        let removed = before - uploads.len();

        if self
            .wizard
            .selected_subject()
            .is_some_and(|subject| doomed.contains(&subject.id))
        {
            self.wizard.clear_subject();
        }
        self.flush_uploads();
        removed
    }

    // ------------------------------------------------------------------
    // Custom clothing / accessory libraries
    // ------------------------------------------------------------------

    pub fn add_custom_item(&mut self, item_type: ItemType, source: ImageRef) -> StoredImage {
        let image = StoredImage::new(source);
        self.library_mut(item_type).insert(0, image.clone());
        self.flush_items(item_type);
        image
    }

    pub fn delete_custom_item(&mut self, item_type: ItemType, id: &ImageId) -> usize {
        self.delete_custom_items(item_type, std::slice::from_ref(id))
    }

    pub fn delete_custom_items(&mut self, item_type: ItemType, ids: &[ImageId]) -> usize {
        let doomed: HashSet<&ImageId> = ids.iter().collect();
        let library = self.library_mut(item_type);
        let before = library.len();
        library.retain(|image| !doomed.contains(&image.id));
        let removed = before - library.len();

        if self
            .wizard
            .selected_item()
            .is_some_and(|item| doomed.contains(&item.id))
        {
            self.wizard.clear_item();
        }
        self.flush_items(item_type);
        removed
    }

    fn library_mut(&mut self, item_type: ItemType) -> &mut Vec<StoredImage> {
        match item_type {
            ItemType::Clothing => &mut self.custom_clothing,
            ItemType::Accessory => &mut self.custom_accessories,
        }
    }

    // ------------------------------------------------------------------
    // Results and history
    // ------------------------------------------------------------------

    /// Shows a generated result and records it when the selection is complete.
    pub fn apply_result(&mut self, result: ImageRef) -> Option<HistoryItem> {
        self.wizard.set_last_result(result.clone());
        self.record_history(result)
    }

    /// Prepends a history entry for the current selection.
    ///
    /// No entry is created unless both a subject and an item are selected.
    pub fn record_history(&mut self, result: ImageRef) -> Option<HistoryItem> {
        let (Some(subject), Some(item)) = (self.wizard.selected_subject(), self.wizard.selected_item())
        else {
            tracing::debug!("Skipping history entry: selection incomplete");
            return None;
        };

        let entry = HistoryItem {
            id: Uuid::new_v4().to_string(),
            subject_image: subject.source.clone(),
            item_image: item.source.clone(),
            result_image: result,
            created_at: Utc::now(),
            category: self.wizard.selected_category(),
            item_type: self.wizard.selected_item_type(),
        };
        self.history.insert(0, entry.clone());
        self.flush_history();
        Some(entry)
    }

    /// Removes all history entries whose id is listed.
    pub fn delete_history(&mut self, ids: &[String]) -> usize {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = self.history.len();
        self.history.retain(|item| !doomed.contains(item.id.as_str()));
        let removed = before - self.history.len();
        self.flush_history();
        removed
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn flush_uploads(&self) {
        self.repository.save_custom_uploads(&self.custom_uploads);
    }

    fn flush_items(&self, item_type: ItemType) {
        self.repository
            .save_custom_items(item_type, self.custom_items(item_type));
    }

    fn flush_history(&self) {
        self.repository.save_history(&self.history);
    }
}
