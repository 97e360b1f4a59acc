//! Error types.
//!
//! - `CoreError`: typed failures of the forecaster / tag lookup. The UI boundary
//!   is expected to match on these and render a fallback.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Failures raised by the core functions (`forecast`, `movie_tags`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The series is too short to fit any model.
    #[error("Insufficient data: need at least {required} monthly periods, got {actual}.")]
    InsufficientData { required: usize, actual: usize },

    /// The country/movie filter selected zero revenue rows.
    #[error("No revenue data for {}.", describe_selection(.country, .movie))]
    NoMatchingData { country: String, movie: String },

    /// Tag lookup for a movie that has no row in the tag table.
    #[error("Movie not found in tag table: '{0}'.")]
    MovieNotFound(String),

    /// A record violates the data model (bad month, negative revenue, ...).
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Forecaster settings out of range (horizon, confidence level, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model search/fit failed numerically.
    #[error("Model fit failed: {0}")]
    ModelFit(String),
}

impl CoreError {
    /// Process exit code used when the error reaches `main`.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoreError::InvalidRecord(_) | CoreError::InvalidConfig(_) => 2,
            CoreError::InsufficientData { .. }
            | CoreError::NoMatchingData { .. }
            | CoreError::MovieNotFound(_) => 3,
            CoreError::ModelFit(_) => 4,
        }
    }
}

fn describe_selection(country: &str, movie: &str) -> String {
    if movie.is_empty() {
        format!("country '{country}'")
    } else {
        format!("movie '{movie}' in country '{country}'")
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
