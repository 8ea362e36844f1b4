//! Error types for the migration adapter.

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A field could not be resolved on the model.
    #[error("failed to look up field with name: {0}")]
    FieldNotFound(String),

    /// An index could not be resolved on the model.
    #[error("failed to look up index with name: {0}")]
    IndexNotFound(String),

    /// The driver reported an execution failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A catalog row could not be decoded.
    #[error("Failed to scan column {column}: {message}")]
    Scan {
        /// Zero-based position of the column in the row.
        column: usize,
        /// What went wrong.
        message: String,
    },

    /// The model description is unusable (e.g. empty table name).
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// IO error (reading model or config files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrateError {
    /// Wraps a driver error message.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
