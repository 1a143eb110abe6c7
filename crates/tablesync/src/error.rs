//! Error types for table reconciliation.

/// Errors that can occur while handling a lifecycle event.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The event's request type is not one of Create, Update or Delete.
    #[error("Unrecognized event type: {0}")]
    UnrecognizedEventKind(String),

    /// The remote engine rejected or failed a statement.
    #[error("Statement failed: {statement}: {message}")]
    StatementExecutionFailure {
        /// The statement that failed.
        statement: String,
        /// Failure reported by the executor.
        message: String,
    },

    /// A declared schema violates a table invariant.
    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    /// The event lacks a field required by its kind.
    #[error("Missing required event field: {0}")]
    MissingField(&'static str),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (reading event files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Builds a [`SyncError::StatementExecutionFailure`].
    pub fn execution(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StatementExecutionFailure {
            statement: statement.into(),
            message: message.into(),
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, SyncError>;
