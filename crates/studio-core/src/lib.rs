pub mod catalog;
pub mod config;
pub mod error;
pub mod generation;
pub mod image;
pub mod model;
pub mod prompt;
pub mod state;
pub mod variation;
pub mod viewer;
pub mod wizard;

// Re-export common types
pub use error::{GenerationError, Result, StudioError};
pub use image::{ImageId, ImageRef, StoredImage};
pub use model::{CustomUploadSet, HistoryItem, ItemType, SubjectCategory};
pub use state::{StudioRepository, StudioState};
pub use wizard::{WizardState, WizardStep};
