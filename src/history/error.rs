// Error types for the history engine

use thiserror::Error;

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur while writing refs or replaying history
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A side effect registered through `on_execute` (or a bound resource) failed
    #[error("Side effect failed: {0}")]
    SideEffectFailed(String),

    /// A subscriber rejected a change
    #[error("Subscriber of '{name}' failed: {reason}")]
    SubscriberFailed { name: String, reason: String },

    /// Reentrant writes nested deeper than the configured ceiling
    #[error("Reentrancy limit of {limit} exceeded while writing '{name}'")]
    ReentrancyLimit { name: String, limit: usize },

    /// `end_batch` was called without a matching `begin_batch`
    #[error("No batch is open")]
    NoOpenBatch,
}

impl HistoryError {
    /// Shorthand for [`HistoryError::SideEffectFailed`]
    pub fn side_effect(reason: impl Into<String>) -> Self {
        HistoryError::SideEffectFailed(reason.into())
    }

    /// Shorthand for [`HistoryError::SubscriberFailed`]
    pub fn subscriber(name: impl Into<String>, reason: impl Into<String>) -> Self {
        HistoryError::SubscriberFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
