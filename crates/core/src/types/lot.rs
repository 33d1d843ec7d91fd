//! Lot tracking types.

use serde::{Deserialize, Serialize};

use super::id::{BusinessPartnerCode, ItemCode};
use super::origin::Origin;

/// Whether an item must be received with a lot code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotRequirement {
    /// Lot tracking is enabled for the item.
    pub tracked: bool,
}

/// An existing lot that can be reused for a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotRecord {
    /// Internal lot code.
    pub lot: String,
    /// Supplier lot code.
    #[serde(default)]
    pub business_partner_lot: Option<String>,
}

/// Existing lots for an (item, origin, business partner) scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingLotSet {
    /// Number of matching lots.
    pub count: usize,
    /// Matching lots.
    #[serde(default)]
    pub lots: Vec<LotRecord>,
}

/// Criteria for an existing lot lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LotQuery {
    /// Item code.
    pub item: ItemCode,
    /// Origin of the line being received.
    pub origin: Origin,
    /// Supplier, for purchase receipts.
    pub business_partner: Option<BusinessPartnerCode>,
    /// Restrict to one lot code (manual entry validation).
    pub lot: Option<String>,
}
