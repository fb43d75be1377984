//! End-to-end persistence through the directory-backed store.

use std::fs;

use studio_core::image::ImageRef;
use studio_core::model::{ItemType, SubjectCategory};
use studio_core::state::{StudioRepository, StudioState};
use studio_infrastructure::storage::{trimmed_len, FileStore, KeyValueStore, MemoryStore};
use studio_infrastructure::studio_repository::{
    CUSTOM_ACCESSORIES_KEY, CUSTOM_CLOTHES_KEY, CUSTOM_UPLOADS_KEY, HISTORY_KEY,
};
use studio_infrastructure::StoreBackedRepository;
use tempfile::TempDir;

fn upload(n: usize) -> ImageRef {
    ImageRef::from_base64("image/png", &format!("iVBORw0KGgo{:04}", n))
}

#[test]
fn state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("store");

    let (subject_id, item_id) = {
        let mut state = StudioState::load(StoreBackedRepository::new(FileStore::new(dir.clone())));
        let subject = state.add_custom_upload(SubjectCategory::Animal, upload(1));
        let item = state.add_custom_item(ItemType::Accessory, upload(2));

        state.select_category(SubjectCategory::Animal);
        state.select_subject_by_id(&subject.id).unwrap();
        state.select_item_by_id(&item.id).unwrap();
        state.advance().unwrap();
        state.advance().unwrap();
        assert!(state.apply_result(upload(3)).is_some());
        (subject.id, item.id)
    };

    let state = StudioState::load(StoreBackedRepository::new(FileStore::new(dir)));
    assert_eq!(state.custom_uploads(SubjectCategory::Animal)[0].id, subject_id);
    assert_eq!(state.custom_items(ItemType::Accessory)[0].id, item_id);
    assert!(state.custom_items(ItemType::Clothing).is_empty());

    let history = state.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].category, SubjectCategory::Animal);
    assert_eq!(history[0].item_type, ItemType::Accessory);
    assert_eq!(history[0].result_image, upload(3));
}

#[test]
fn quota_overflow_keeps_first_half() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();

    let mut items = Vec::new();
    {
        let mut state = StudioState::load(StoreBackedRepository::new(FileStore::new(dir.clone())));
        for n in 0..8 {
            items.insert(0, state.add_custom_item(ItemType::Clothing, upload(n)));
        }
    }
    let full_len = fs::read_to_string(dir.join(format!("{}.json", CUSTOM_CLOTHES_KEY)))
        .unwrap()
        .len() as u64;

    // One byte short of the full list forces a trim on the next write.
    let repo = StoreBackedRepository::new(FileStore::with_quota(dir.clone(), full_len - 1));
    repo.save_custom_items(ItemType::Clothing, &items);

    let reloaded = StoreBackedRepository::new(FileStore::new(dir)).load_custom_items(ItemType::Clothing);
    assert_eq!(reloaded.len(), trimmed_len(items.len()));
    assert_eq!(reloaded, items[..4].to_vec());
}

#[test]
fn second_quota_failure_keeps_previous_value() {
    let memory = MemoryStore::with_quota(400);
    let repo = StoreBackedRepository::new(memory);
    let mut state = StudioState::load(repo);
    state.add_custom_item(ItemType::Accessory, upload(1));
    let before = state
        .repository()
        .store()
        .inner()
        .get(CUSTOM_ACCESSORIES_KEY)
        .unwrap();
    assert!(before.is_some());

    let huge = ImageRef::from_base64("image/png", &"A".repeat(1000));
    state.add_custom_item(ItemType::Accessory, huge);

    let after = state
        .repository()
        .store()
        .inner()
        .get(CUSTOM_ACCESSORIES_KEY)
        .unwrap();
    assert_eq!(after, before);
}

#[test]
fn malformed_keys_reset_independently() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().to_path_buf());

    let seeded = StoreBackedRepository::new(store.clone());
    let mut state = StudioState::load(seeded);
    state.add_custom_item(ItemType::Clothing, upload(1));
    state.add_custom_item(ItemType::Accessory, upload(2));
    state.add_custom_upload(SubjectCategory::Person, upload(3));

    for key in [HISTORY_KEY, CUSTOM_UPLOADS_KEY] {
        store.set(key, "{ not json").unwrap();
    }

    let state = StudioState::load(StoreBackedRepository::new(store));
    assert!(state.history().is_empty());
    assert!(state.custom_uploads(SubjectCategory::Person).is_empty());
    assert_eq!(state.custom_items(ItemType::Clothing).len(), 1);
    assert_eq!(state.custom_items(ItemType::Accessory).len(), 1);
}

#[test]
fn identical_legacy_uploads_survive_reload() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();
    let same = "data:image/png;base64,iVBORw0KGgoSAME";
    FileStore::new(dir.clone())
        .set(
            CUSTOM_UPLOADS_KEY,
            &format!(r#"{{"person": ["{same}", "{same}"]}}"#),
        )
        .unwrap();

    let ids = {
        let mut state = StudioState::load(StoreBackedRepository::new(FileStore::new(dir.clone())));
        let uploads = state.custom_uploads(SubjectCategory::Person).to_vec();
        assert_eq!(uploads.len(), 2);
        assert_ne!(uploads[0].id, uploads[1].id);

        // Any mutation flushes the whole set back.
        state.add_custom_upload(SubjectCategory::Person, upload(1));
        state
            .custom_uploads(SubjectCategory::Person)
            .iter()
            .map(|image| image.id.clone())
            .collect::<Vec<_>>()
    };

    let state = StudioState::load(StoreBackedRepository::new(FileStore::new(dir)));
    let reloaded: Vec<_> = state
        .custom_uploads(SubjectCategory::Person)
        .iter()
        .map(|image| image.id.clone())
        .collect();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded, ids);
}
