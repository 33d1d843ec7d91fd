//! Business origin of an order line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The business process that created an order line.
///
/// Declaration order is the default order in which received lines are probed
/// when an order has no open lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Purchase order from a supplier.
    Purchase,
    /// Sales order (customer returns).
    Sales,
    /// Warehouse transfer order.
    Transfer,
    /// Manually created warehouse transfer.
    TransferManual,
    /// Production order output.
    Production,
}

/// Error returned when an origin name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid origin: {0}")]
pub struct OriginParseError(pub String);

impl Origin {
    /// All origins in default probing order.
    pub const ALL: [Self; 5] = [
        Self::Purchase,
        Self::Sales,
        Self::Transfer,
        Self::TransferManual,
        Self::Production,
    ];

    /// Stable machine name, as used in configuration and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sales => "sales",
            Self::Transfer => "transfer",
            Self::TransferManual => "transfer_manual",
            Self::Production => "production",
        }
    }

    /// Human-readable label for badges and pickers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Purchase => "Purchase",
            Self::Sales => "Sales",
            Self::Transfer => "Transfer",
            Self::TransferManual => "Transfer (manual)",
            Self::Production => "Production",
        }
    }

    /// Whether receipts for this origin record the supplier's own lot code.
    #[must_use]
    pub const fn requires_business_partner_lot(self) -> bool {
        matches!(self, Self::Purchase)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Origin {
    type Err = OriginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "purchase" => Ok(Self::Purchase),
            "sales" => Ok(Self::Sales),
            "transfer" => Ok(Self::Transfer),
            "transfer_manual" | "transfermanual" => Ok(Self::TransferManual),
            "production" => Ok(Self::Production),
            _ => Err(OriginParseError(s.to_string())),
        }
    }
}
