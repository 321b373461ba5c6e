// Notifications - how the calling layer surfaces failed edits to the user

use crate::history::error::HistoryError;
use chrono::{DateTime, Utc};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// What the notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    /// Undo/redo and batching
    History,
    /// A bound resource (audio parameter, device) refused a value
    Binding,
    Generic,
}

/// Notification with timestamp and metadata
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification stamped with the current time
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        Self {
            level,
            category,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// Error notification for a write or redo that failed
    pub fn from_error(err: &HistoryError) -> Self {
        let category = match err {
            HistoryError::SideEffectFailed(_) => NotificationCategory::Binding,
            HistoryError::SubscriberFailed { .. } => NotificationCategory::Generic,
            HistoryError::ReentrancyLimit { .. } | HistoryError::NoOpenBatch => {
                NotificationCategory::History
            }
        };
        Self::error(category, err.to_string())
    }
}
