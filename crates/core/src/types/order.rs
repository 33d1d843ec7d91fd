//! Order line and received line types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{BusinessPartnerCode, ItemCode, OrderNumber, ReceiptNumber};
use super::origin::Origin;

/// An open (not yet received) order line as returned by the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Order number.
    pub order: OrderNumber,
    /// Line (position) number within the order.
    pub line: u32,
    /// Item code.
    pub item: ItemCode,
    /// Item description.
    #[serde(default)]
    pub item_description: String,
    /// Quantity still expected on this line.
    pub to_be_received_qty: Decimal,
    /// Unit of the ordered quantity.
    pub order_unit: String,
    /// Business origin of the line.
    pub origin: Origin,
    /// Supplier the goods are bought from (purchase lines only).
    #[serde(default)]
    pub buy_from_business_partner: Option<BusinessPartnerCode>,
}

/// Criteria for an open order line lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineQuery {
    /// Order number.
    pub order: OrderNumber,
    /// Restrict to one line.
    pub line: Option<u32>,
    /// Restrict to one origin.
    pub origin: Option<Origin>,
}

impl OrderLineQuery {
    /// Query all open lines of an order.
    #[must_use]
    pub const fn order(order: OrderNumber) -> Self {
        Self {
            order,
            line: None,
            origin: None,
        }
    }
}

/// A received but not yet confirmed receipt line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedLine {
    /// ERP transaction identifier.
    pub transaction_id: String,
    /// Optimistic concurrency tag, when the ERP provides one.
    #[serde(default)]
    pub etag: Option<String>,
    /// Order number.
    pub order: OrderNumber,
    /// Order position (line).
    pub position: u32,
    /// Receipt sequence within the position.
    pub sequence: u32,
    /// Receipt set.
    pub set: u32,
    /// Delivery note / packing slip the goods arrived with.
    pub packing_slip: String,
    /// Item code.
    pub item: ItemCode,
    /// Received quantity.
    pub quantity: Decimal,
    /// Unit of the received quantity.
    pub unit: String,
    /// Internal lot code.
    #[serde(default)]
    pub lot: Option<String>,
    /// Supplier lot code.
    #[serde(default)]
    pub business_partner_lot: Option<String>,
    /// Receipt number.
    #[serde(default)]
    pub receipt_number: Option<ReceiptNumber>,
    /// Line within the receipt.
    #[serde(default)]
    pub receipt_line: Option<u32>,
}

/// Received lines for one (order, origin) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedLineSet {
    /// Number of received lines.
    pub count: usize,
    /// The lines themselves.
    #[serde(default)]
    pub lines: Vec<ReceivedLine>,
}

impl ReceivedLineSet {
    /// Whether nothing is waiting for confirmation.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}
