//! Operator-facing notifications.

use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Operation succeeded.
    Success,
    /// Informational.
    Info,
    /// Operator input was refused; nothing failed remotely.
    Warning,
    /// A remote operation failed.
    Error,
}

/// A message shown to the operator after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Main message.
    pub message: String,
    /// Additional server-provided details.
    pub details: Option<String>,
}

impl Notification {
    /// Create a notification without details.
    #[must_use]
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            details: None,
        }
    }

    /// Success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    /// Whether this notification reports a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.level, NotificationLevel::Warning | NotificationLevel::Error)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}
