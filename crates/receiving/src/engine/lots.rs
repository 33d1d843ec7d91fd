//! Lot requirement resolution and manual lot validation.

use inbound_core::{
    BusinessPartnerCode, ExistingLotSet, ItemCode, LotQuery, LotRequirement, OrderLine, Origin,
};
use tracing::{debug, instrument};

use super::session::{Focus, ResolutionSession};
use crate::erp::ErpConnector;
use crate::error::ReceivingError;

/// Lot information fetched for a selected line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotResolution {
    /// Item the requirement belongs to.
    pub item: ItemCode,
    /// Whether the item is lot-tracked.
    pub requirement: LotRequirement,
    /// Scope of the existing-lot lookup, `None` when it was gated.
    pub scope: Option<LotQuery>,
    /// Existing lots in scope.
    pub existing: ExistingLotSet,
}

/// Outcome of validating a typed lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotValidation {
    /// The ERP knows the lot.
    Accepted,
    /// Item, origin or supplier unknown; the lot is accepted unchecked.
    Skipped,
    /// The ERP does not know the lot.
    Rejected,
}

/// Inputs of a manual lot validation, captured from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotCheck {
    /// Item of the selected line, empty when none is selected.
    pub item: ItemCode,
    /// Origin of the selected line.
    pub origin: Option<Origin>,
    /// Supplier for purchase receipts.
    pub business_partner: Option<BusinessPartnerCode>,
    /// Lot as typed.
    pub lot: String,
}

/// Existing-lot scope for a line.
///
/// Purchase lines are scoped to their supplier; without one there is nothing
/// meaningful to suggest and `None` is returned.
#[must_use]
pub fn existing_lot_scope(line: &OrderLine) -> Option<LotQuery> {
    let business_partner = if line.origin.requires_business_partner_lot() {
        Some(line.buy_from_business_partner.clone().filter(|bp| !bp.is_empty())?)
    } else {
        None
    };
    Some(LotQuery {
        item: line.item.clone(),
        origin: line.origin,
        business_partner,
        lot: None,
    })
}

/// Fetch the lot requirement and, for tracked items, the existing lots.
///
/// A requirement cached for the same item in the current resolution cycle is
/// reused.
///
/// # Errors
///
/// Returns `ReceivingError::Network` when the ERP cannot be queried.
#[instrument(skip(connector, line, cached), fields(item = %line.item, origin = %line.origin))]
pub async fn resolve_lots<C>(
    connector: &C,
    line: &OrderLine,
    cached: Option<LotRequirement>,
) -> Result<LotResolution, ReceivingError>
where
    C: ErpConnector + ?Sized,
{
    let requirement = match cached {
        Some(requirement) => requirement,
        None => connector
            .get_lot_tracking(&line.item)
            .await
            .map_err(ReceivingError::Network)?,
    };

    if !requirement.tracked {
        return Ok(LotResolution {
            item: line.item.clone(),
            requirement,
            scope: None,
            existing: ExistingLotSet::default(),
        });
    }

    let scope = existing_lot_scope(line);
    let existing = match &scope {
        Some(query) => connector
            .get_existing_lots(query)
            .await
            .map_err(ReceivingError::Network)?,
        None => {
            debug!("No business partner on purchase line, existing lots not queried");
            ExistingLotSet::default()
        }
    };

    Ok(LotResolution {
        item: line.item.clone(),
        requirement,
        scope,
        existing,
    })
}

/// Check a typed lot against the existing lots of its scope.
///
/// Purchase lots without a supplier have no scope to check against and are
/// accepted unchecked.
///
/// # Errors
///
/// Returns `ReceivingError::Network` when the ERP cannot be queried.
#[instrument(skip(connector, check), fields(item = %check.item, lot = %check.lot))]
pub async fn validate_lot<C>(connector: &C, check: &LotCheck) -> Result<LotValidation, ReceivingError>
where
    C: ErpConnector + ?Sized,
{
    let Some(origin) = check.origin.filter(|_| !check.item.is_empty()) else {
        debug!("Lot accepted without validation");
        return Ok(LotValidation::Skipped);
    };
    if origin.requires_business_partner_lot() && check.business_partner.is_none() {
        debug!("No business partner on purchase line, lot accepted without validation");
        return Ok(LotValidation::Skipped);
    }

    let query = LotQuery {
        item: check.item.clone(),
        origin,
        business_partner: check.business_partner.clone(),
        lot: Some(check.lot.clone()),
    };
    let found = connector
        .get_existing_lots(&query)
        .await
        .map_err(ReceivingError::Network)?;

    Ok(if found.count > 0 {
        LotValidation::Accepted
    } else {
        LotValidation::Rejected
    })
}

impl ResolutionSession {
    /// Line and cached requirement to resolve lots for.
    #[must_use]
    pub fn lot_target(&self) -> Option<(OrderLine, Option<LotRequirement>)> {
        let line = self.selected.clone()?;
        let cached = self
            .lot_requirement_cache
            .as_ref()
            .filter(|(item, _)| *item == line.item)
            .map(|(_, requirement)| *requirement);
        Some((line, cached))
    }

    /// Apply fetched lot information.
    ///
    /// Information for an item other than the selected line's is ignored.
    #[must_use]
    pub fn on_lot_resolution(mut self, resolution: LotResolution) -> Self {
        if self.item() != Some(&resolution.item) {
            debug!(item = %resolution.item, "Lot information for another item ignored");
            return self;
        }
        self.lot_requirement_cache = Some((resolution.item, resolution.requirement));
        self.lots.requirement = Some(resolution.requirement);
        if resolution.requirement.tracked {
            self.lots.scope = resolution.scope;
            self.lots.existing = resolution.existing;
            self.focus = Focus::Lot;
        } else {
            self.lots.scope = None;
            self.lots.existing = ExistingLotSet::default();
            self.lots.lot.clear();
            self.lots.business_partner_lot.clear();
            self.lots.accepted = false;
            self.focus = Focus::DeliveryNote;
        }
        self
    }

    /// Inputs for validating the typed lot, `None` when nothing needs
    /// checking.
    #[must_use]
    pub fn lot_check(&self) -> Option<LotCheck> {
        let lot = self.lots.lot.trim();
        if !self.lots.tracked() || lot.is_empty() || self.lots.accepted {
            return None;
        }
        let selected = self.selected.as_ref();
        Some(LotCheck {
            item: selected.map(|l| l.item.clone()).unwrap_or_default(),
            origin: selected.map(|l| l.origin).or(self.origin),
            business_partner: self
                .lots
                .scope
                .as_ref()
                .and_then(|scope| scope.business_partner.clone()),
            lot: lot.to_string(),
        })
    }

    /// Apply the result of a manual lot validation.
    ///
    /// A rejected lot clears the field, returns focus to it and yields
    /// `ReceivingError::ValidationRejected` alongside the updated session.
    pub fn on_lot_validation(
        mut self,
        check: &LotCheck,
        validation: LotValidation,
    ) -> (Self, Result<(), ReceivingError>) {
        match validation {
            LotValidation::Accepted | LotValidation::Skipped => {
                self.lots.accepted = true;
                self.focus = self.after_lot_focus();
                (self, Ok(()))
            }
            LotValidation::Rejected => {
                self.guard_mut().touch_lot();
                self.lots.lot.clear();
                self.lots.accepted = false;
                self.focus = Focus::Lot;
                let error =
                    ReceivingError::ValidationRejected(format!("Unknown lot {}", check.lot));
                (self, Err(error))
            }
        }
    }

    /// The operator picked one of the existing lots.
    ///
    /// The supplier lot of the record is carried over when present. An
    /// index outside the list is refused with
    /// `ReceivingError::ValidationRejected`.
    pub fn choose_existing_lot(mut self, index: usize) -> (Self, Result<(), ReceivingError>) {
        let Some(record) = self.lots.existing.lots.get(index).cloned() else {
            let error = ReceivingError::ValidationRejected(format!("No lot #{}", index + 1));
            return (self, Err(error));
        };

        self.guard_mut().touch_lot();
        self.lots.lot = record.lot;
        if let Some(bp_lot) = record.business_partner_lot {
            self.lots.business_partner_lot = bp_lot;
        }
        self.lots.accepted = true;
        self.focus = self.after_lot_focus();
        (self, Ok(()))
    }

    fn after_lot_focus(&self) -> Focus {
        if self.business_partner_lot_visible() && self.lots.business_partner_lot.trim().is_empty() {
            Focus::BusinessPartnerLot
        } else {
            Focus::DeliveryNote
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use inbound_core::{LotRecord, OrderNumber};
    use rust_decimal::Decimal;

    use super::*;

    fn line(origin: Origin, business_partner: Option<&str>) -> OrderLine {
        OrderLine {
            order: OrderNumber::new("200000066"),
            line: 10,
            item: ItemCode::new("RAW-100"),
            item_description: "Resin".to_string(),
            to_be_received_qty: Decimal::new(5, 0),
            order_unit: "kg".to_string(),
            origin,
            buy_from_business_partner: business_partner.map(BusinessPartnerCode::new),
        }
    }

    fn tracked_session(origin: Origin, business_partner: Option<&str>) -> ResolutionSession {
        let selected = line(origin, business_partner);
        let scope = existing_lot_scope(&selected);
        ResolutionSession::default()
            .with_order("200000066")
            .select_line(selected.clone())
            .on_lot_resolution(LotResolution {
                item: selected.item,
                requirement: LotRequirement { tracked: true },
                scope,
                existing: ExistingLotSet {
                    count: 2,
                    lots: vec![
                        LotRecord {
                            lot: "L-1".to_string(),
                            business_partner_lot: Some("SUP-9".to_string()),
                        },
                        LotRecord {
                            lot: "L-2".to_string(),
                            business_partner_lot: None,
                        },
                    ],
                },
            })
    }

    #[test]
    fn test_purchase_without_business_partner_is_gated() {
        assert!(existing_lot_scope(&line(Origin::Purchase, None)).is_none());
        assert!(existing_lot_scope(&line(Origin::Purchase, Some(" "))).is_none());
    }

    #[test]
    fn test_purchase_scope_carries_business_partner() {
        let scope = existing_lot_scope(&line(Origin::Purchase, Some("BP-7"))).unwrap();
        assert_eq!(scope.business_partner.unwrap().as_str(), "BP-7");
    }

    #[test]
    fn test_other_origins_ignore_business_partner() {
        let scope = existing_lot_scope(&line(Origin::Sales, Some("BP-7"))).unwrap();
        assert!(scope.business_partner.is_none());
        assert_eq!(scope.origin, Origin::Sales);
    }

    #[test]
    fn test_untracked_item_focuses_delivery_note() {
        let selected = line(Origin::Sales, None);
        let session = ResolutionSession::default()
            .with_order("200000066")
            .select_line(selected.clone())
            .with_lot("stale")
            .on_lot_resolution(LotResolution {
                item: selected.item,
                requirement: LotRequirement { tracked: false },
                scope: None,
                existing: ExistingLotSet::default(),
            });
        assert!(!session.lot_visible());
        assert!(session.lots.lot.is_empty());
        assert_eq!(session.focus, Focus::DeliveryNote);
    }

    #[test]
    fn test_tracked_item_focuses_lot() {
        let session = tracked_session(Origin::Sales, None);
        assert!(session.lot_visible());
        assert_eq!(session.lots.existing.count, 2);
        assert_eq!(session.focus, Focus::Lot);
    }

    #[test]
    fn test_requirement_cached_for_same_item() {
        let session = tracked_session(Origin::Sales, None);
        let (_, cached) = session.lot_target().unwrap();
        assert_eq!(cached, Some(LotRequirement { tracked: true }));
    }

    #[test]
    fn test_rejected_lot_cleared_and_refocused() {
        let session = tracked_session(Origin::Sales, None).with_lot("L-404");
        let check = session.lot_check().unwrap();
        let (session, result) = session.on_lot_validation(&check, LotValidation::Rejected);
        assert!(matches!(result, Err(ReceivingError::ValidationRejected(_))));
        assert!(session.lots.lot.is_empty());
        assert_eq!(session.focus, Focus::Lot);
        assert!(session.missing_fields().contains(&"lot"));
    }

    #[test]
    fn test_accepted_purchase_lot_requires_business_partner_lot() {
        let session = tracked_session(Origin::Purchase, Some("BP-7")).with_lot("L-1");
        assert!(!session.business_partner_lot_visible());

        let check = session.lot_check().unwrap();
        let (session, result) = session.on_lot_validation(&check, LotValidation::Accepted);
        assert!(result.is_ok());
        assert!(session.business_partner_lot_visible());
        assert_eq!(session.focus, Focus::BusinessPartnerLot);
        assert!(session.missing_fields().contains(&"business partner lot"));
    }

    #[test]
    fn test_choose_existing_lot_fills_business_partner_lot() {
        let (session, result) = tracked_session(Origin::Purchase, Some("BP-7")).choose_existing_lot(0);
        assert!(result.is_ok());
        assert_eq!(session.lots.lot, "L-1");
        assert_eq!(session.lots.business_partner_lot, "SUP-9");
        assert!(session.lots.accepted);
        assert_eq!(session.focus, Focus::DeliveryNote);
        assert!(session.lot_check().is_none());
    }

    #[test]
    fn test_resolution_for_other_item_ignored() {
        let session = ResolutionSession::default()
            .with_order("200000066")
            .select_line(line(Origin::Sales, None))
            .on_lot_resolution(LotResolution {
                item: ItemCode::new("RAW-999"),
                requirement: LotRequirement { tracked: true },
                scope: None,
                existing: ExistingLotSet::default(),
            });
        assert!(session.lots.requirement.is_none());
        assert!(!session.lot_visible());
        assert!(session.lot_target().unwrap().1.is_none());
        assert_eq!(session.focus, Focus::Quantity);
    }

    #[test]
    fn test_purchase_lot_check_without_business_partner() {
        let session = tracked_session(Origin::Purchase, None).with_lot("L-1");
        let check = session.lot_check().unwrap();
        assert_eq!(check.origin, Some(Origin::Purchase));
        assert!(check.business_partner.is_none());
    }

    #[test]
    fn test_choose_existing_lot_out_of_range() {
        let (session, result) = tracked_session(Origin::Sales, None).choose_existing_lot(5);
        assert!(result.is_err());
        assert!(session.lots.lot.is_empty());
    }
}
