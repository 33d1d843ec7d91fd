//! Receipt and confirmation requests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderNumber, ReceiptNumber};
use super::order::ReceivedLine;
use super::origin::Origin;

/// A request to receive goods against an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    /// Order number.
    pub order: OrderNumber,
    /// Order position (line).
    pub position: u32,
    /// Receipt sequence, always 1 for new receipts.
    pub sequence: u32,
    /// Receipt set, always 1 for new receipts.
    pub set: u32,
    /// Delivery note / packing slip.
    pub packing_slip: String,
    /// Internal lot code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    /// Supplier lot code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_partner_lot: Option<String>,
    /// Quantity received.
    pub quantity: Decimal,
    /// Unit of the quantity.
    pub unit: String,
    /// `Some(false)` asks the ERP not to confirm the receipt on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<bool>,
}

/// Bookkeeping returned when a receipt is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAck {
    /// Receipt number.
    #[serde(default)]
    pub receipt_number: Option<ReceiptNumber>,
    /// Line within the receipt.
    #[serde(default)]
    pub receipt_line: Option<u32>,
}

/// A request to confirm a received line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// Origin of the order.
    pub origin: Origin,
    /// Order number.
    pub order: OrderNumber,
    /// Order position (line).
    pub position: u32,
    /// Receipt sequence.
    pub sequence: u32,
    /// Receipt set.
    pub set: u32,
    /// Delivery note / packing slip.
    pub packing_slip: String,
    /// Quantity to confirm.
    pub quantity: Decimal,
    /// Unit of the quantity.
    pub unit: String,
    /// Internal lot code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    /// Supplier lot code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_partner_lot: Option<String>,
    /// Receipt number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<ReceiptNumber>,
    /// Line within the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_line: Option<u32>,
    /// ERP transaction identifier of the received line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Concurrency tag of the received line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ConfirmRequest {
    /// Confirm a receipt that was just created without confirmation.
    #[must_use]
    pub fn for_new_receipt(origin: Origin, receipt: &ReceiptRequest, ack: &ReceiptAck) -> Self {
        Self {
            origin,
            order: receipt.order.clone(),
            position: receipt.position,
            sequence: receipt.sequence,
            set: receipt.set,
            packing_slip: receipt.packing_slip.clone(),
            quantity: receipt.quantity,
            unit: receipt.unit.clone(),
            lot: receipt.lot.clone(),
            business_partner_lot: receipt.business_partner_lot.clone(),
            receipt_number: ack.receipt_number.clone(),
            receipt_line: ack.receipt_line,
            transaction_id: None,
            etag: None,
        }
    }

    /// Confirm a line listed among the received lines of an order.
    #[must_use]
    pub fn for_received_line(origin: Origin, line: &ReceivedLine) -> Self {
        Self {
            origin,
            order: line.order.clone(),
            position: line.position,
            sequence: line.sequence,
            set: line.set,
            packing_slip: line.packing_slip.clone(),
            quantity: line.quantity,
            unit: line.unit.clone(),
            lot: line.lot.clone(),
            business_partner_lot: line.business_partner_lot.clone(),
            receipt_number: line.receipt_number.clone(),
            receipt_line: line.receipt_line,
            transaction_id: Some(line.transaction_id.clone()),
            etag: line.etag.clone(),
        }
    }
}
