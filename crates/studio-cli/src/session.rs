//! Executes REPL commands against the studio use case.
//!
//! Generation runs on background tasks so the prompt stays responsive;
//! results come back through an mpsc channel and are printed by
//! [`print_events`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use colored::Colorize;
use tokio::sync::{Mutex, mpsc};

use studio_application::{GeneratedResult, StudioUseCase};
use studio_core::error::StudioError;
use studio_core::image::{ImageId, ImageRef, StoredImage};
use studio_core::model::ItemType;
use studio_core::state::{StudioRepository, StudioState};
use studio_core::viewer::{Point, ResultViewer, ViewMode};
use studio_core::wizard::WizardStep;
use studio_infrastructure::uploads;

use crate::command::{Command, HELP, Pick, Target};

/// Width of the virtual scrub track; `scrub` takes a percentage of it.
const TRACK_WIDTH: f32 = 100.0;

pub enum Flow {
    Continue,
    Quit,
}

/// Outcome of a background generation task.
pub enum Event {
    Generated(GeneratedResult),
    Turnaround(ImageRef),
    Designed(StoredImage, ItemType),
    Failed(&'static str, StudioError),
}

/// Viewer state of the displayed result, shared with background tasks.
#[derive(Default)]
pub struct ViewerSlot {
    pub viewer: ResultViewer,
    /// Turnaround sprite and the request token it was generated under.
    sprite: Option<(u64, ImageRef)>,
    turnaround_pending: bool,
}

impl ViewerSlot {
    fn sprite_for(&self, token: u64) -> Option<&ImageRef> {
        self.sprite
            .as_ref()
            .filter(|(sprite_token, _)| *sprite_token == token)
            .map(|(_, sprite)| sprite)
    }
}

pub struct Session<R: StudioRepository + Sync + 'static> {
    use_case: Arc<StudioUseCase<R>>,
    viewer: Arc<Mutex<ViewerSlot>>,
    item_tab: ItemType,
    events: mpsc::Sender<Event>,
}

fn resolve_pick(list: &[StoredImage], pick: &Pick) -> Result<ImageId> {
    match pick {
        Pick::Index(n) => list
            .get(n - 1)
            .map(|image| image.id.clone())
            .with_context(|| format!("No image at position {} (list has {})", n, list.len())),
        Pick::Id(id) => Ok(ImageId::new(id.as_str())),
    }
}

fn print_list(title: &str, list: &[StoredImage], selected: Option<&StoredImage>) {
    println!("{}", title.bright_magenta().bold());
    if list.is_empty() {
        println!("{}", "  (empty)".bright_black());
    }
    for (i, image) in list.iter().enumerate() {
        let marker = if selected.is_some_and(|s| s.id == image.id) {
            "*".bright_green().to_string()
        } else {
            " ".to_string()
        };
        let origin = if image.id.is_preset() { "preset" } else { "custom" };
        println!(
            "{}{:>3}. {} {}",
            marker,
            i + 1,
            image.source.summary(),
            format!("[{}, {}]", origin, image.id).bright_black()
        );
    }
}

fn print_step(step: WizardStep) {
    let text = match step {
        WizardStep::SelectSubject => "Step 1: choose a subject ('subjects', 'subject <n>')",
        WizardStep::SelectItem => "Step 2: choose an item ('items', 'item <n>')",
        WizardStep::Result => "Step 3: result ('generate', 'turnaround', 'view ...')",
    };
    println!("{}", text.bright_blue());
}

fn print_viewer(slot: &ViewerSlot) {
    let viewer = &slot.viewer;
    let mut line = format!("view={} zoom={:.1}x", viewer.mode(), viewer.zoom());
    let pan = viewer.pan();
    if pan != Point::default() {
        line.push_str(&format!(" pan=({:.0},{:.0})", pan.x, pan.y));
    }
    match viewer.mode() {
        ViewMode::TiltCard => {
            let rotation = viewer.rotation();
            line.push_str(&format!(" tilt=({:.0}°,{:.0}°)", rotation.x, rotation.y));
        }
        ViewMode::Turnaround => {
            if slot.sprite.is_some() {
                line.push_str(&format!(" frame={}", viewer.frame()));
            } else {
                line.push_str(" (no turnaround yet)");
            }
        }
        ViewMode::Flat => {}
    }
    println!("{}", line.bright_black());
}

/// Prints background results until every sender is dropped.
pub async fn print_events(mut events: mpsc::Receiver<Event>) {
    while let Some(event) = events.recv().await {
        match event {
            Event::Generated(result) => {
                println!(
                    "{} {}",
                    "Result ready:".bright_green().bold(),
                    result.image.summary()
                );
                println!(
                    "{}",
                    format!("  pose: {}, angle: {}", result.variation.pose, result.variation.angle)
                        .bright_black()
                );
                if result.history.is_some() {
                    println!("{}", "  saved to history".bright_black());
                }
            }
            Event::Turnaround(sprite) => {
                println!(
                    "{} {} {}",
                    "Turnaround ready:".bright_green().bold(),
                    sprite.summary(),
                    "('view turnaround', 'scrub <percent>')".bright_black()
                );
            }
            Event::Designed(item, item_type) => {
                println!(
                    "{} {} {}",
                    format!("New {} designed:", item_type).bright_green().bold(),
                    item.source.summary(),
                    format!("[{}]", item.id).bright_black()
                );
            }
            Event::Failed(what, StudioError::StaleResult) => {
                println!(
                    "{}",
                    format!("{} discarded: the selection changed meanwhile", what).yellow()
                );
            }
            Event::Failed(what, err) => {
                tracing::debug!("[Session] {} failed: {:?}", what, err);
                eprintln!("{} {}", format!("{} failed:", what).red().bold(), err.user_message().red());
                if err.is_retryable() {
                    eprintln!("{}", "  You can retry the same command.".bright_black());
                }
            }
        }
    }
}

impl<R: StudioRepository + Sync + 'static> Session<R> {
    pub fn new(use_case: Arc<StudioUseCase<R>>, events: mpsc::Sender<Event>) -> Self {
        Self {
            use_case,
            viewer: Arc::new(Mutex::new(ViewerSlot::default())),
            item_tab: ItemType::Clothing,
            events,
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Help => println!("{}", HELP),
            Command::Status => self.status().await,
            Command::Quit => return Ok(Flow::Quit),

            Command::Category(category) => {
                self.use_case.select_category(category).await;
                self.list_subjects().await;
            }
            Command::ListSubjects => self.list_subjects().await,
            Command::ListItems(item_type) => {
                if let Some(item_type) = item_type {
                    self.item_tab = item_type;
                }
                self.list_items().await;
            }
            Command::Select(target, pick) => self.select(target, &pick).await?,
            Command::Upload(target, path) => self.upload(target, &path).await?,
            Command::Delete(target, picks) => self.delete(target, &picks).await?,
            Command::Design(description) => self.design(description),

            Command::Next => {
                let step = self.use_case.advance().await?;
                print_step(step);
                if step == WizardStep::Result {
                    self.generate();
                }
            }
            Command::Back => {
                let step = self.use_case.back().await?;
                print_step(step);
            }
            Command::Reset => {
                self.use_case.reset().await;
                *self.viewer.lock().await = ViewerSlot::default();
                print_step(WizardStep::SelectSubject);
            }
            Command::Generate => self.generate(),
            Command::Turnaround => self.turnaround().await,

            Command::History => self.list_history().await,
            Command::HistoryLoad(n) => self.load_history(n).await?,
            Command::HistoryDelete(positions) => self.delete_history(&positions).await?,

            Command::View(mode) => {
                let token = self.use_case.request_token();
                let needs_sprite = {
                    let mut slot = self.viewer.lock().await;
                    slot.viewer.set_mode(mode);
                    print_viewer(&slot);
                    mode == ViewMode::Turnaround && slot.sprite_for(token).is_none()
                };
                let has_result = self
                    .use_case
                    .read(|state| state.wizard().last_result().is_some())
                    .await;
                if needs_sprite && has_result {
                    self.turnaround().await;
                }
            }
            Command::ZoomIn => {
                let mut slot = self.viewer.lock().await;
                slot.viewer.zoom_in();
                print_viewer(&slot);
            }
            Command::ZoomOut => {
                let mut slot = self.viewer.lock().await;
                slot.viewer.zoom_out();
                print_viewer(&slot);
            }
            Command::Tilt(dx, dy) => {
                let mut slot = self.viewer.lock().await;
                if slot.viewer.mode() != ViewMode::TiltCard {
                    bail!("Switch to the tilt view first ('view tilt')");
                }
                slot.viewer.drag_start(Point::default(), TRACK_WIDTH);
                slot.viewer.drag_move(Point::new(dx, dy), TRACK_WIDTH);
                slot.viewer.drag_end();
                print_viewer(&slot);
            }
            Command::Scrub(percent) => {
                let mut slot = self.viewer.lock().await;
                if slot.viewer.mode() != ViewMode::Turnaround {
                    bail!("Switch to the turnaround view first ('view turnaround')");
                }
                slot.viewer.drag_start(Point::new(percent, 0.0), TRACK_WIDTH);
                slot.viewer.drag_end();
                print_viewer(&slot);
            }
            Command::Save(path) => self.save(&path).await?,
        }
        Ok(Flow::Continue)
    }

    async fn status(&self) {
        let (step, category, item_type, subject, item, result, history) = self
            .use_case
            .read(|state| {
                let wizard = state.wizard();
                (
                    wizard.step(),
                    wizard.selected_category(),
                    wizard.selected_item_type(),
                    wizard.selected_subject().map(|s| s.source.summary()),
                    wizard.selected_item().map(|s| s.source.summary()),
                    wizard.last_result().map(ImageRef::summary),
                    state.history().len(),
                )
            })
            .await;

        print_step(step);
        let none = || "-".bright_black().to_string();
        println!("  category: {}", category);
        println!("  subject:  {}", subject.unwrap_or_else(none));
        println!("  item:     {} ({})", item.unwrap_or_else(none), item_type);
        println!("  result:   {}", result.unwrap_or_else(none));
        println!("  history:  {} entries, item tab: {}", history, self.item_tab);
        if step == WizardStep::Result {
            print_viewer(&*self.viewer.lock().await);
        }
    }

    async fn list_subjects(&self) {
        self.use_case
            .read(|state| {
                let category = state.wizard().selected_category();
                print_list(
                    &format!("Subjects ({})", category),
                    &state.subjects(category),
                    state.wizard().selected_subject(),
                );
            })
            .await
    }

    async fn list_items(&self) {
        let item_type = self.item_tab;
        self.use_case
            .read(|state| {
                print_list(
                    &format!("Items ({})", item_type),
                    &state.items(item_type),
                    state.wizard().selected_item(),
                );
            })
            .await
    }

    async fn select(&mut self, target: Target, pick: &Pick) -> Result<()> {
        match target {
            Target::Subject => {
                let list = self
                    .use_case
                    .read(|state| state.subjects(state.wizard().selected_category()))
                    .await;
                let id = resolve_pick(&list, pick)?;
                let subject = self.use_case.select_subject(&id).await?;
                println!("{} {}", "Subject selected:".green(), subject.source.summary());
            }
            Target::Item => {
                let item_tab = self.item_tab;
                let list = self.use_case.read(|state| state.items(item_tab)).await;
                let id = resolve_pick(&list, pick)?;
                self.item_tab = self.use_case.select_item(&id).await?;
                println!("{} {}", format!("{} selected:", self.item_tab).green(), id);
            }
        }
        Ok(())
    }

    async fn upload(&mut self, target: Target, path: &Path) -> Result<()> {
        let image = uploads::read_image_file(path)?;
        let item_tab = self.item_tab;
        let stored = self
            .use_case
            .update(|state| match target {
                Target::Subject => {
                    let category = state.wizard().selected_category();
                    let stored = state.add_custom_upload(category, image);
                    state.select_subject(stored.clone());
                    stored
                }
                Target::Item => {
                    let stored = state.add_custom_item(item_tab, image);
                    state.select_item(stored.clone(), item_tab);
                    stored
                }
            })
            .await;
        println!(
            "{} {} {}",
            "Uploaded and selected:".green(),
            stored.source.summary(),
            format!("[{}]", stored.id).bright_black()
        );
        Ok(())
    }

    async fn delete(&mut self, target: Target, picks: &[Pick]) -> Result<()> {
        let item_tab = self.item_tab;
        let list = self
            .use_case
            .read(|state| match target {
                Target::Subject => state.subjects(state.wizard().selected_category()),
                Target::Item => state.items(item_tab),
            })
            .await;

        let mut ids = Vec::with_capacity(picks.len());
        for pick in picks {
            let id = resolve_pick(&list, pick)?;
            if id.is_preset() {
                println!("{}", format!("Skipping preset {}", id).yellow());
            } else {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Ok(());
        }

        let removed = self
            .use_case
            .update(|state| match target {
                Target::Subject => {
                    let category = state.wizard().selected_category();
                    state.delete_custom_uploads(category, &ids)
                }
                Target::Item => state.delete_custom_items(item_tab, &ids),
            })
            .await;
        println!("{}", format!("Removed {} image(s)", removed).green());
        Ok(())
    }

    fn design(&self, description: String) {
        let use_case = Arc::clone(&self.use_case);
        let events = self.events.clone();
        let item_type = self.item_tab;
        println!("{}", format!("Designing {}...", item_type).bright_black());

        tokio::spawn(async move {
            let event = match use_case.generate_item(&description, item_type).await {
                Ok(item) => Event::Designed(item, item_type),
                Err(err) => Event::Failed("Design", err),
            };
            let _ = events.send(event).await;
        });
    }

    fn generate(&self) {
        let use_case = Arc::clone(&self.use_case);
        let viewer = Arc::clone(&self.viewer);
        let events = self.events.clone();
        println!("{}", "Generating result...".bright_black());

        tokio::spawn(async move {
            let event = match use_case.generate_result().await {
                Ok(result) => {
                    *viewer.lock().await = ViewerSlot::default();
                    Event::Generated(result)
                }
                Err(err) => Event::Failed("Generation", err),
            };
            let _ = events.send(event).await;
        });
    }

    /// Starts a turnaround request unless a sprite for the current
    /// selection exists or one is already on its way.
    async fn turnaround(&self) {
        {
            let mut slot = self.viewer.lock().await;
            if let Some(sprite) = slot.sprite_for(self.use_case.request_token()) {
                println!(
                    "{} {}",
                    "Turnaround already generated:".green(),
                    sprite.summary()
                );
                return;
            }
            if slot.turnaround_pending {
                println!("{}", "Turnaround views are still being generated...".bright_black());
                return;
            }
            slot.turnaround_pending = true;
            slot.sprite = None;
            slot.viewer.set_turnaround_ready(false);
        }

        let use_case = Arc::clone(&self.use_case);
        let viewer = Arc::clone(&self.viewer);
        let events = self.events.clone();
        println!("{}", "Generating turnaround views...".bright_black());

        tokio::spawn(async move {
            let result = use_case.generate_turnaround().await;
            let mut slot = viewer.lock().await;
            slot.turnaround_pending = false;
            let event = match result {
                Ok(sprite) => {
                    slot.sprite = Some((use_case.request_token(), sprite.clone()));
                    slot.viewer.set_turnaround_ready(true);
                    Event::Turnaround(sprite)
                }
                Err(err) => Event::Failed("Turnaround", err),
            };
            drop(slot);
            let _ = events.send(event).await;
        });
    }

    async fn list_history(&self) {
        self.use_case
            .read(|state| {
                println!("{}", "History".bright_magenta().bold());
                if state.history().is_empty() {
                    println!("{}", "  (empty)".bright_black());
                }
                for (i, item) in state.history().iter().enumerate() {
                    println!(
                        "{:>3}. {} {} + {} -> {}",
                        i + 1,
                        item.created_at.format("%Y-%m-%d %H:%M"),
                        item.subject_image.summary(),
                        item.item_image.summary(),
                        item.result_image.summary()
                    );
                }
            })
            .await
    }

    async fn history_id(&self, position: usize) -> Result<String> {
        self.use_case
            .read(|state| state.history().get(position - 1).map(|item| item.id.clone()))
            .await
            .with_context(|| format!("No history entry at position {}", position))
    }

    async fn load_history(&mut self, position: usize) -> Result<()> {
        let id = self.history_id(position).await?;
        let record = self.use_case.restore_history(&id).await?;
        self.item_tab = record.item_type;
        *self.viewer.lock().await = ViewerSlot::default();
        println!(
            "{} {}",
            "Restored result:".green(),
            record.result_image.summary()
        );
        print_step(WizardStep::Result);
        Ok(())
    }

    async fn delete_history(&mut self, positions: &[usize]) -> Result<()> {
        let mut ids = Vec::with_capacity(positions.len());
        for &position in positions {
            ids.push(self.history_id(position).await?);
        }
        let removed = self.use_case.update(|state| state.delete_history(&ids)).await;
        println!("{}", format!("Removed {} history entr(y/ies)", removed).green());
        Ok(())
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let result = self
            .use_case
            .read(|state| state.wizard().last_result().cloned())
            .await
            .context("No result to save yet")?;
        write_image(&result, path)?;
        println!("{} {}", "Saved".green(), path.display());
        Ok(())
    }
}

/// Writes a data-URI image to `path` as raw bytes.
fn write_image(image: &ImageRef, path: &Path) -> Result<()> {
    let Some(uri) = image.parse_data_uri() else {
        bail!("Only generated or uploaded images can be saved, not {}", image.summary());
    };
    let bytes = BASE64_STANDARD
        .decode(uri.data)
        .context("Result image is not valid base64")?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Reports how the state was restored at startup.
pub fn describe_loaded<R: StudioRepository>(state: &StudioState<R>) -> String {
    format!(
        "{} history entries, {} custom clothing, {} custom accessories",
        state.history().len(),
        state.custom_items(ItemType::Clothing).len(),
        state.custom_items(ItemType::Accessory).len()
    )
}
