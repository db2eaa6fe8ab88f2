//! Error types for the modulation scope.
//!
//! The sampling path (sampler, edge expander, clipper) is total and never
//! produces these. They come from the boundaries: constructing validated
//! inputs, waiting on a rendering surface, talking to the modulation
//! backend, and loading configuration.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

#[derive(Error, Debug)]
pub enum ScopeError {
    /// The container or its surface has not been mounted yet.
    /// Recovered by polling, never shown to the user.
    #[error("Rendering surface '{0}' is not ready")]
    SurfaceNotReady(String),

    #[error("Series {0} does not exist on this surface")]
    UnknownSeries(usize),

    #[error("Time and amplitude arrays differ in length: {t} vs {y}")]
    MismatchedLengths { t: usize, y: usize },

    #[error("Invalid signal parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid time window: start {start} must be below end {end}")]
    InvalidWindow { start: f64, end: f64 },

    /// The backend answered with an explicit error payload.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No Tokio runtime is available on this thread")]
    NoRuntime,

    #[error("Scope engine has stopped")]
    EngineStopped,

    #[error("UI error: {0}")]
    Ui(String),
}
