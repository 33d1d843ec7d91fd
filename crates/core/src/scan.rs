//! Scan code parsing.
//!
//! Handheld scanners deliver order labels either as a bare order number or as
//! an order number fused with a line number, e.g. `200000066/10`.

use serde::{Deserialize, Serialize};

/// Characters accepted between the order and line parts of a scan.
pub const SCAN_SEPARATORS: [char; 6] = ['/', '|', '\\', ',', ';', '-'];

/// An order/line pair decoded from a single scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanCode {
    /// Order number.
    pub order: String,
    /// Line number as scanned (not yet validated against the order).
    pub line: String,
}

impl ScanCode {
    /// Re-encode the pair with the given separator.
    #[must_use]
    pub fn join(&self, separator: char) -> String {
        format!("{}{separator}{}", self.order, self.line)
    }
}

/// Split a scanned string into an order and a line.
///
/// Returns `None` when no separator is present (the whole input is then an
/// order number on its own) or when fewer than two non-empty parts remain.
/// Extra parts after the line are ignored.
#[must_use]
pub fn parse_scan(raw: &str) -> Option<ScanCode> {
    if !raw.contains(SCAN_SEPARATORS) {
        return None;
    }

    let mut parts = raw
        .split(SCAN_SEPARATORS)
        .map(str::trim)
        .filter(|part| !part.is_empty());

    let order = parts.next()?;
    let line = parts.next()?;

    Some(ScanCode {
        order: order.to_string(),
        line: line.to_string(),
    })
}
