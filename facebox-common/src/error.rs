//! Facebox error types
use thiserror::Error;

use crate::controller::Phase;

/// Errors raised while building settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Page or call override was not valid JSON for the settings shape
    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Image extension list could not be compiled into a matcher
    #[error("Invalid image type pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// Opacity must lie within 0..=1
    #[error("Opacity out of range: {0}")]
    InvalidOpacity(f64),
}

/// Errors surfaced by the modal controller and its hosts
#[derive(Error, Debug)]
pub enum FaceboxError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The markup skeleton could not be injected into the page
    #[error("Template injection failed: {0}")]
    Template(String),
    /// A reveal arrived while no loading cycle was active
    #[error("Cannot reveal while {0:?}")]
    NotLoading(Phase),
    /// The controller is mid-notification; the call came from an observer
    #[error("Facebox is busy delivering an event")]
    Busy,
    /// Browser host failure (missing window, document or body)
    #[error("DOM error: {0}")]
    Dom(String),
}

impl FaceboxError {
    pub fn template(e: impl std::fmt::Display) -> Self {
        Self::Template(e.to_string())
    }
    pub fn dom(e: impl std::fmt::Display) -> Self {
        Self::Dom(e.to_string())
    }
}
