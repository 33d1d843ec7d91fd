//! Unified error handling for the receiving engine.

use thiserror::Error;

use crate::erp::ErpError;
use crate::notification::{Notification, NotificationLevel};

/// Engine-level error type.
///
/// Every variant is recovered at the screen boundary and turned into a
/// [`Notification`]; none of them end the session.
#[derive(Debug, Error)]
pub enum ReceivingError {
    /// No open or received lines for the scanned code.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A typed value was checked against the ERP and refused.
    #[error("Rejected: {0}")]
    ValidationRejected(String),

    /// Submission attempted with required fields missing.
    #[error("Incomplete: {0}")]
    Incomplete(String),

    /// The ERP refused to create the receipt.
    #[error("Receipt failed: {message}")]
    Receipt {
        /// Server-provided message.
        message: String,
        /// Server-provided details.
        details: Option<String>,
    },

    /// The ERP refused to confirm the receipt.
    #[error("Confirmation failed: {message}")]
    Confirm {
        /// Server-provided message.
        message: String,
        /// Server-provided details.
        details: Option<String>,
    },

    /// The ERP could not be reached or answered unreadably.
    #[error("Network error: {0}")]
    Network(ErpError),
}

impl ReceivingError {
    /// Map a failed receipt creation.
    #[must_use]
    pub fn receipt(error: ErpError) -> Self {
        match refusal(&error) {
            Some((message, details)) => Self::Receipt { message, details },
            None => Self::Network(error),
        }
    }

    /// Map a failed confirmation.
    #[must_use]
    pub fn confirm(error: ErpError) -> Self {
        match refusal(&error) {
            Some((message, details)) => Self::Confirm { message, details },
            None => Self::Network(error),
        }
    }

    /// Whether the failure happened on the ERP side of a submission or
    /// transport, as opposed to operator input.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Receipt { .. } | Self::Confirm { .. } | Self::Network(_)
        )
    }

    /// Convert into a user-visible notification.
    ///
    /// Remote failures are reported to Sentry and logged.
    #[must_use]
    pub fn into_notification(self) -> Notification {
        if self.is_remote() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Receiving request failed"
            );
        } else {
            tracing::info!(error = %self, "Receiving input refused");
        }

        match self {
            Self::NotFound(what) => Notification::new(
                NotificationLevel::Warning,
                format!("Nothing to receive for {what}"),
            ),
            Self::ValidationRejected(reason) | Self::Incomplete(reason) => {
                Notification::new(NotificationLevel::Warning, reason)
            }
            Self::Receipt { message, details } | Self::Confirm { message, details } => {
                Notification::new(NotificationLevel::Error, message).with_details(details)
            }
            Self::Network(error) => Notification::new(
                NotificationLevel::Error,
                "The ERP could not be reached. Try again.",
            )
            .with_details(Some(error.to_string())),
        }
    }
}

/// Message and details of an ERP answer that refused the request.
///
/// Transport and parse failures are not refusals.
fn refusal(error: &ErpError) -> Option<(String, Option<String>)> {
    if let Some((message, details)) = error.server_message() {
        return Some((message.to_string(), details.map(str::to_string)));
    }
    match error {
        ErpError::Status(status) => Some((format!("ERP answered with status {status}"), None)),
        _ => None,
    }
}
