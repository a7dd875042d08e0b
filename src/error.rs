use thiserror::Error;

/// Error types for handler operations.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler configuration is missing a value or holds an invalid one.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input provided to the handler.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The form store rejected a read or write.
    #[error("Form store error: {0}")]
    Store(String),

    /// The remote API client failed to create or execute a call.
    #[error("Remote call {entity}.{action} failed: {message}")]
    Remote {
        entity: String,
        action: String,
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn remote(
        entity: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        HandlerError::Remote {
            entity: entity.into(),
            action: action.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        HandlerError::Store(message.into())
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;
