//! Error types for daybook.

use thiserror::Error;

/// Errors that can occur in daybook operations.
#[derive(Error, Debug)]
pub enum DaybookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}'. Expected HH:MM")]
    InvalidTime(String),

    /// The remote table has no such column (schema drift between deployments).
    #[error("Remote column '{0}' does not exist")]
    MissingColumn(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Calendar authorization expired or was revoked. Reconnect your account")]
    CalendarAuthExpired,

    #[error("{0}")]
    Validation(String),
}

impl DaybookError {
    /// True when the error means the user must re-authorize the calendar.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, DaybookError::CalendarAuthExpired)
    }
}

impl From<serde_json::Error> for DaybookError {
    fn from(e: serde_json::Error) -> Self {
        DaybookError::Serialization(e.to_string())
    }
}

/// Result type alias for daybook operations.
pub type DaybookResult<T> = Result<T, DaybookError>;
