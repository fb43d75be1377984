//! Adapters to remote services: the Gemini image generator and the HTTP
//! image resolver.

pub mod gemini_image_client;
pub mod image_resolver;

pub use gemini_image_client::GeminiImageClient;
pub use image_resolver::HttpImageResolver;
