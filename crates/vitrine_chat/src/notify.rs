//! One-shot user notifications.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::ChatError;

/// How prominently a notice should be shown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A message for the user, displayed once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// Notice for a terminal chat error.
    ///
    /// The daily limit and fatal responses are errors; everything else is a
    /// warning the user can act on by resending.
    pub fn from_error(err: &ChatError) -> Self {
        let level = match err {
            ChatError::QuotaExceeded | ChatError::Fatal(_) => NoticeLevel::Error,
            _ => NoticeLevel::Warning,
        };
        Self {
            level,
            message: err.to_string(),
        }
    }
}

/// Presents notices to the user
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sink that only logs. Used when no UI presenter is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Warning => warn!(target: "vitrine::notice", "{}", notice.message),
            NoticeLevel::Error => error!(target: "vitrine::notice", "{}", notice.message),
        }
    }
}
