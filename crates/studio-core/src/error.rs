//! Error types for Style Studio.

use thiserror::Error;

use crate::wizard::TransitionError;

/// Failures reported by the remote image-generation service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The service answered but the response carried no image part.
    ///
    /// `refusal` holds any text the model returned instead of an image.
    #[error("no image produced")]
    NoImageProduced { refusal: Option<String> },

    /// The response carried an image part whose payload cannot be used.
    #[error("image produced was unusable: {0}")]
    UnusableImage(String),

    /// The service returned a non-success HTTP status.
    #[error("generation service error ({status}): {message}")]
    Service {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// Network or transport level failure.
    #[error("generation request failed: {0}")]
    Transport(String),

    /// No API key could be found in the environment or secret file.
    #[error("API key not found")]
    MissingApiKey,
}

impl GenerationError {
    pub fn is_no_image(&self) -> bool {
        matches!(self, Self::NoImageProduced { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A shared error type for the entire studio.
#[derive(Error, Debug, Clone)]
pub enum StudioError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Input typed or chosen by the user was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A wizard step transition was rejected.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Remote generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A remote image reference could not be materialised.
    #[error("Could not load image '{source_url}': {message}")]
    ImageFetch { source_url: String, message: String },

    /// An operation needed a subject and an item but one was missing.
    #[error("Missing selection: {0}")]
    MissingSelection(&'static str),

    /// A generation result arrived after the wizard moved on.
    #[error("Generation result discarded because the selection changed")]
    StaleResult,
}

impl StudioError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn image_fetch(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageFetch {
            source_url: source_url.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same action could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(GenerationError::Service { retryable, .. }) => *retryable,
            Self::Generation(GenerationError::MissingApiKey) => false,
            Self::Generation(_) | Self::ImageFetch { .. } | Self::StaleResult => true,
            _ => false,
        }
    }

    /// Text shown to the user, with the action they can take next.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(GenerationError::NoImageProduced { refusal: Some(_) }) => {
                "The AI could not produce an image (it may have been blocked by a safety policy). \
                 Try a different image or retry."
                    .to_string()
            }
            Self::Generation(GenerationError::NoImageProduced { refusal: None }) => {
                "The AI returned no image. Please retry.".to_string()
            }
            Self::Generation(GenerationError::UnusableImage(_)) => {
                "The AI returned an image that could not be used. Please retry.".to_string()
            }
            Self::Generation(GenerationError::MissingApiKey) => {
                "No API key configured. Set GEMINI_API_KEY or add it to secret.json.".to_string()
            }
            Self::Generation(other) => format!("Generation failed ({other}). Please retry."),
            Self::ImageFetch { .. } => {
                "Could not load this image (possibly due to cross-origin restrictions or the \
                 network). If it is a preset, download it and upload it as a local file instead."
                    .to_string()
            }
            Self::InvalidInput(message) => message.clone(),
            Self::StaleResult => {
                "The selection changed while generating; the result was discarded.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// A type alias for `Result<T, StudioError>`.
pub type Result<T> = std::result::Result<T, StudioError>;
