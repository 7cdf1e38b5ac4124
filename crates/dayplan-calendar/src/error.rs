//! Calendar-specific error types.

use dayplan_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    /// A caller passed arguments that can never be valid (e.g. an inverted window).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Event source error: {0}")]
    Source(#[from] anyhow::Error),
}

impl CalendarError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidArgument(_) => "The requested date range is not valid.".to_string(),
            Self::Source(_) => "Could not load events. Please try again.".to_string(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

impl From<CalendarError> for AppError {
    fn from(e: CalendarError) -> Self {
        match e {
            CalendarError::InvalidArgument(s) => AppError::Calendar(s),
            CalendarError::Source(err) => AppError::EventSource(format!("{:#}", err)),
        }
    }
}
