//! Studio use case.
//!
//! `StudioUseCase` coordinates the state container with the image resolver
//! and the remote generator. The state lock is never held across a network
//! call; instead every generation captures a request token and its result is
//! only applied if the selection has not changed in the meantime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use studio_core::error::{Result, StudioError};
use studio_core::generation::{ImageGenerator, ImageResolver, TryOnRequest, TurnaroundRequest};
use studio_core::image::{ImageId, ImageRef, StoredImage};
use studio_core::model::{HistoryItem, ItemType, SubjectCategory};
use studio_core::state::{StudioRepository, StudioState};
use studio_core::variation::Variation;
use studio_core::wizard::{WizardState, WizardStep};
use tokio::sync::Mutex;

/// Identity of the current selection. Any change invalidates in-flight work.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionKey {
    step: WizardStep,
    category: SubjectCategory,
    item_type: ItemType,
    subject: Option<ImageId>,
    item: Option<ImageId>,
}

impl SelectionKey {
    fn of(wizard: &WizardState) -> Self {
        Self {
            step: wizard.step(),
            category: wizard.selected_category(),
            item_type: wizard.selected_item_type(),
            subject: wizard.selected_subject().map(|image| image.id.clone()),
            item: wizard.selected_item().map(|image| image.id.clone()),
        }
    }
}

/// A generated try-on result that was applied to the state.
#[derive(Debug, Clone)]
pub struct GeneratedResult {
    pub image: ImageRef,
    /// History entry recorded for the result, if the selection was complete.
    pub history: Option<HistoryItem>,
    pub variation: Variation,
}

/// Everything a generation call needs, captured under the lock.
struct Snapshot {
    token: u64,
    subject: StoredImage,
    item: StoredImage,
    category: SubjectCategory,
    item_type: ItemType,
}

pub struct StudioUseCase<R: StudioRepository> {
    state: Mutex<StudioState<R>>,
    generator: Arc<dyn ImageGenerator>,
    resolver: Arc<dyn ImageResolver>,
    request_token: AtomicU64,
}

impl<R: StudioRepository> StudioUseCase<R> {
    pub fn new(
        state: StudioState<R>,
        generator: Arc<dyn ImageGenerator>,
        resolver: Arc<dyn ImageResolver>,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            generator,
            resolver,
            request_token: AtomicU64::new(0),
        }
    }

    /// Current request token.
    pub fn request_token(&self) -> u64 {
        self.request_token.load(Ordering::SeqCst)
    }

    fn invalidate(&self) -> u64 {
        self.request_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Runs `f` against the state without changing it.
    pub async fn read<T>(&self, f: impl FnOnce(&StudioState<R>) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Runs `f` against the state. If the selection or step changed, pending
    /// generations are invalidated.
    pub async fn update<T>(&self, f: impl FnOnce(&mut StudioState<R>) -> T) -> T {
        let mut state = self.state.lock().await;
        let before = SelectionKey::of(state.wizard());
        let result = f(&mut state);
        if SelectionKey::of(state.wizard()) != before {
            let token = self.invalidate();
            tracing::trace!("[StudioUseCase] Selection changed, request token {}", token);
        }
        result
    }

    // ------------------------------------------------------------------
    // Navigation and selection
    // ------------------------------------------------------------------

    pub async fn select_category(&self, category: SubjectCategory) {
        self.update(|state| state.select_category(category)).await
    }

    pub async fn select_subject(&self, id: &ImageId) -> Result<StoredImage> {
        self.update(|state| state.select_subject_by_id(id)).await
    }

    pub async fn select_item(&self, id: &ImageId) -> Result<ItemType> {
        self.update(|state| state.select_item_by_id(id)).await
    }

    pub async fn advance(&self) -> Result<WizardStep> {
        self.update(|state| state.advance()).await
    }

    pub async fn back(&self) -> Result<WizardStep> {
        self.update(|state| state.back()).await
    }

    pub async fn reset(&self) {
        self.update(|state| state.reset()).await
    }

    pub async fn restore_history(&self, id: &str) -> Result<HistoryItem> {
        self.update(|state| state.restore_history(id)).await
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    /// Moves to the result step (if needed) and captures the selection.
    async fn begin_generation(&self) -> Result<Snapshot> {
        self.update(|state| -> Result<()> {
            let wizard = state.wizard();
            if wizard.selected_subject().is_none() {
                return Err(StudioError::MissingSelection("subject"));
            }
            if wizard.selected_item().is_none() {
                return Err(StudioError::MissingSelection("item"));
            }
            while state.wizard().step() != WizardStep::Result {
                state.advance()?;
            }
            Ok(())
        })
        .await?;

        self.read(|state| {
            let wizard = state.wizard();
            match (wizard.selected_subject(), wizard.selected_item()) {
                (Some(subject), Some(item)) => Ok(Snapshot {
                    token: self.request_token(),
                    subject: subject.clone(),
                    item: item.clone(),
                    category: wizard.selected_category(),
                    item_type: wizard.selected_item_type(),
                }),
                _ => Err(StudioError::MissingSelection("subject and item")),
            }
        })
        .await
    }

    fn ensure_current(&self, token: u64) -> Result<()> {
        if token == self.request_token() {
            Ok(())
        } else {
            tracing::info!(
                "[StudioUseCase] Discarding result for request {} (current {})",
                token,
                self.request_token()
            );
            Err(StudioError::StaleResult)
        }
    }

    /// Generates a try-on image for the current selection and shows it.
    pub async fn generate_result(&self) -> Result<GeneratedResult> {
        let snapshot = self.begin_generation().await?;

        let subject = self.resolver.resolve(&snapshot.subject.source).await?;
        let item = self.resolver.resolve(&snapshot.item.source).await?;
        let variation = Variation::random(snapshot.category, snapshot.item_type);
        tracing::info!(
            "[StudioUseCase] Generating {} / {} with pose '{}'",
            snapshot.category,
            snapshot.item_type,
            variation.pose
        );

        let image = self
            .generator
            .generate_try_on(TryOnRequest {
                subject,
                item,
                category: snapshot.category,
                item_type: snapshot.item_type,
                variation,
            })
            .await
            .inspect_err(|e| tracing::warn!("[StudioUseCase] Generation failed: {}", e))?;

        let mut state = self.state.lock().await;
        self.ensure_current(snapshot.token)?;
        let history = state.apply_result(image.clone());
        Ok(GeneratedResult {
            image,
            history,
            variation,
        })
    }

    /// Generates a front/side/back sprite for the current selection.
    ///
    /// The sprite is returned to the caller and not recorded in history.
    pub async fn generate_turnaround(&self) -> Result<ImageRef> {
        let snapshot = self.begin_generation().await?;

        let subject = self.resolver.resolve(&snapshot.subject.source).await?;
        let item = self.resolver.resolve(&snapshot.item.source).await?;
        let sprite = self
            .generator
            .generate_turnaround(TurnaroundRequest {
                subject,
                item,
                category: snapshot.category,
            })
            .await?;

        let _state = self.state.lock().await;
        self.ensure_current(snapshot.token)?;
        Ok(sprite)
    }

    /// Generates an item from a description and adds it to the library.
    ///
    /// The new item is selected unless the selection changed meanwhile.
    pub async fn generate_item(&self, description: &str, item_type: ItemType) -> Result<StoredImage> {
        let description = description.trim();
        if description.is_empty() {
            return Err(StudioError::invalid_input("Describe the item to design"));
        }

        let token = self.request_token();
        let image = self.generator.generate_item(description).await?;

        let stored = self
            .update(|state| {
                let stored = state.add_custom_item(item_type, image);
                if token == self.request_token() {
                    state.select_item(stored.clone(), item_type);
                }
                stored
            })
            .await;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use studio_core::GenerationError;
    use studio_core::generation::InlineImage;
    use studio_core::state::InMemoryStudioRepository;
    use tokio::sync::Notify;

    const RESULT: &str = "data:image/png;base64,UkVTVUxU";
    const SPRITE: &str = "data:image/png;base64,U1BSSVRF";
    const ITEM: &str = "data:image/png;base64,SVRFTQ==";

    #[derive(Default)]
    struct MockGenerator {
        fail_with: Option<GenerationError>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
        calls: AtomicUsize,
    }

    impl MockGenerator {
        async fn pass(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
            match &self.fail_with {
                Some(err) => Err(err.clone().into()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for MockGenerator {
        async fn generate_item(&self, _description: &str) -> Result<ImageRef> {
            self.pass().await?;
            Ok(ImageRef::new(ITEM))
        }

        async fn generate_try_on(&self, _request: TryOnRequest) -> Result<ImageRef> {
            self.pass().await?;
            Ok(ImageRef::new(RESULT))
        }

        async fn generate_turnaround(&self, _request: TurnaroundRequest) -> Result<ImageRef> {
            self.pass().await?;
            Ok(ImageRef::new(SPRITE))
        }
    }

    struct MockResolver;

    #[async_trait]
    impl ImageResolver for MockResolver {
        async fn resolve(&self, image: &ImageRef) -> Result<InlineImage> {
            if image.as_str().contains("blocked") {
                return Err(StudioError::image_fetch(image.as_str(), "CORS"));
            }
            Ok(InlineImage::new("image/png", "iVBORw0KGgo="))
        }
    }

    fn use_case(generator: MockGenerator) -> StudioUseCase<InMemoryStudioRepository> {
        StudioUseCase::new(
            StudioState::load(InMemoryStudioRepository::new()),
            Arc::new(generator),
            Arc::new(MockResolver),
        )
    }

    async fn select_first_pair(use_case: &StudioUseCase<InMemoryStudioRepository>) {
        let (subject, item) = use_case
            .read(|state| {
                (
                    state.subjects(SubjectCategory::Person)[0].id.clone(),
                    state.items(ItemType::Clothing)[0].id.clone(),
                )
            })
            .await;
        use_case.select_subject(&subject).await.unwrap();
        use_case.select_item(&item).await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_result_records_history() {
        let use_case = use_case(MockGenerator::default());
        select_first_pair(&use_case).await;

        let generated = use_case.generate_result().await.unwrap();
        assert_eq!(generated.image.as_str(), RESULT);
        assert!(generated.history.is_some());

        use_case
            .read(|state| {
                assert_eq!(state.wizard().step(), WizardStep::Result);
                assert_eq!(state.wizard().last_result(), Some(&ImageRef::new(RESULT)));
                assert_eq!(state.history().len(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_generate_requires_both_selections() {
        let generator = MockGenerator::default();
        let use_case = use_case(generator);

        let err = use_case.generate_result().await.unwrap_err();
        assert!(matches!(err, StudioError::MissingSelection("subject")));

        let subject = use_case
            .read(|state| state.subjects(SubjectCategory::Person)[0].id.clone())
            .await;
        use_case.select_subject(&subject).await.unwrap();
        let err = use_case.generate_result().await.unwrap_err();
        assert!(matches!(err, StudioError::MissingSelection("item")));
        use_case.read(|state| assert!(state.history().is_empty())).await;
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_state() {
        let use_case = use_case(MockGenerator {
            fail_with: Some(GenerationError::NoImageProduced { refusal: None }),
            ..Default::default()
        });
        select_first_pair(&use_case).await;

        let err = use_case.generate_result().await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::Generation(GenerationError::NoImageProduced { .. })
        ));
        assert!(err.is_retryable());
        use_case
            .read(|state| {
                assert!(state.history().is_empty());
                assert!(state.wizard().last_result().is_none());
            })
            .await;
    }

    #[tokio::test]
    async fn test_resolver_failure_is_image_fetch() {
        let generator = MockGenerator::default();
        let use_case = use_case(generator);
        let subject = use_case
            .update(|state| {
                state.add_custom_upload(SubjectCategory::Person, ImageRef::new("https://blocked.example/x.png"))
            })
            .await;
        use_case.select_subject(&subject.id).await.unwrap();
        let item = use_case
            .read(|state| state.items(ItemType::Clothing)[0].id.clone())
            .await;
        use_case.select_item(&item).await.unwrap();

        let err = use_case.generate_result().await.unwrap_err();
        assert!(matches!(err, StudioError::ImageFetch { .. }));
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let use_case = Arc::new(use_case(MockGenerator {
            gate: Some((started.clone(), release.clone())),
            ..Default::default()
        }));
        select_first_pair(&use_case).await;

        let pending = {
            let use_case = use_case.clone();
            tokio::spawn(async move { use_case.generate_result().await })
        };
        started.notified().await;

        assert_eq!(use_case.back().await.unwrap(), WizardStep::SelectItem);
        release.notify_one();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, StudioError::StaleResult));
        use_case
            .read(|state| {
                assert_eq!(state.wizard().step(), WizardStep::SelectItem);
                assert!(state.wizard().last_result().is_none());
                assert!(state.history().is_empty());
            })
            .await;
    }

    #[tokio::test]
    async fn test_library_changes_do_not_invalidate() {
        let use_case = use_case(MockGenerator::default());
        let token = use_case.request_token();
        use_case
            .update(|state| state.add_custom_item(ItemType::Accessory, ImageRef::new(ITEM)))
            .await;
        assert_eq!(use_case.request_token(), token);

        use_case.select_category(SubjectCategory::Animal).await;
        assert_ne!(use_case.request_token(), token);
    }

    #[tokio::test]
    async fn test_generate_item_adds_and_selects() {
        let use_case = use_case(MockGenerator::default());
        let stored = use_case
            .generate_item("red silk scarf", ItemType::Accessory)
            .await
            .unwrap();

        use_case
            .read(|state| {
                assert_eq!(state.custom_items(ItemType::Accessory)[0], stored);
                assert_eq!(state.wizard().selected_item(), Some(&stored));
                assert_eq!(state.wizard().selected_item_type(), ItemType::Accessory);
            })
            .await;

        let err = use_case.generate_item("   ", ItemType::Clothing).await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert_eq!(err.user_message(), "Describe the item to design");
    }

    #[tokio::test]
    async fn test_turnaround_is_not_recorded() {
        let use_case = use_case(MockGenerator::default());
        select_first_pair(&use_case).await;

        let sprite = use_case.generate_turnaround().await.unwrap();
        assert_eq!(sprite.as_str(), SPRITE);
        use_case.read(|state| assert!(state.history().is_empty())).await;
    }
}
