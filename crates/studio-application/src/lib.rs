pub mod studio_usecase;

pub use studio_usecase::{GeneratedResult, StudioUseCase};
