//! ERP order and inventory connector.
//!
//! The engine talks to the ERP only through [`ErpConnector`]. The shipped
//! binding is [`HttpErpConnector`], a JSON-over-HTTP client; tests substitute
//! an in-memory implementation.
//!
//! # Context
//!
//! Language and company context are part of the connector's configuration
//! and travel with every request, so the trait methods carry only the
//! business parameters.

pub mod client;
mod wire;

pub use client::HttpErpConnector;

use async_trait::async_trait;
use inbound_core::{
    ConfirmRequest, ExistingLotSet, ItemCode, LotQuery, LotRequirement, OrderLine,
    OrderLineQuery, OrderNumber, Origin, ReceiptAck, ReceiptRequest, ReceivedLineSet,
};
use thiserror::Error;

/// Operations the receiving engine needs from the ERP.
#[async_trait]
pub trait ErpConnector: Send + Sync {
    /// Open (not yet received) lines matching the query.
    async fn lookup_order_lines(&self, query: &OrderLineQuery) -> Result<Vec<OrderLine>, ErpError>;

    /// Received but unconfirmed lines of an order for one origin.
    async fn lookup_received_lines(
        &self,
        order: &OrderNumber,
        origin: Origin,
    ) -> Result<ReceivedLineSet, ErpError>;

    /// Whether the item is lot-tracked.
    async fn get_lot_tracking(&self, item: &ItemCode) -> Result<LotRequirement, ErpError>;

    /// Existing lots for the query scope.
    async fn get_existing_lots(&self, query: &LotQuery) -> Result<ExistingLotSet, ErpError>;

    /// Create a receipt.
    async fn submit_receipt(&self, request: &ReceiptRequest) -> Result<ReceiptAck, ErpError>;

    /// Confirm a received line.
    async fn confirm_receipt(&self, request: &ConfirmRequest) -> Result<(), ErpError>;

    /// Read a global runtime parameter, `None` when it is not defined.
    async fn get_runtime_param(&self, name: &str) -> Result<Option<String>, ErpError>;
}

/// Errors that can occur when interacting with the ERP.
#[derive(Debug, Error)]
pub enum ErpError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The ERP refused the request and explained why.
    #[error("ERP rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
        /// Server-provided details.
        details: Option<String>,
    },

    /// Non-success status without a readable error body.
    #[error("Unexpected ERP status: {0}")]
    Status(u16),

    /// The configured base URL cannot carry resource paths.
    #[error("Invalid ERP URL: {0}")]
    InvalidUrl(String),

    /// The ERP could not be reached.
    #[error("ERP unavailable: {0}")]
    Unavailable(String),
}

impl ErpError {
    /// Server-provided message and details, when the ERP sent any.
    #[must_use]
    pub fn server_message(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Self::Rejected {
                message, details, ..
            } => Some((message.as_str(), details.as_deref())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erp_error_display() {
        let err = ErpError::NotFound("orders/4711/lines".to_string());
        assert_eq!(err.to_string(), "Not found: orders/4711/lines");
    }

    #[test]
    fn test_rejected_error_display() {
        let err = ErpError::Rejected {
            status: 422,
            message: "Quantity exceeds open quantity".to_string(),
            details: None,
        };
        assert_eq!(
            err.to_string(),
            "ERP rejected request (422): Quantity exceeds open quantity"
        );
    }

    #[test]
    fn test_server_message_only_for_rejections() {
        let err = ErpError::Rejected {
            status: 400,
            message: "Lot blocked".to_string(),
            details: Some("Lot L-7 is on hold".to_string()),
        };
        assert_eq!(
            err.server_message(),
            Some(("Lot blocked", Some("Lot L-7 is on hold")))
        );
        assert!(ErpError::Status(502).server_message().is_none());
        assert!(ErpError::Unavailable("timeout".to_string()).server_message().is_none());
    }
}
