//! Domain state container and its persistence seam.

pub mod container;
pub mod repository;
pub mod sanitize;

pub use container::StudioState;
pub use repository::{InMemoryStudioRepository, StudioRepository};
