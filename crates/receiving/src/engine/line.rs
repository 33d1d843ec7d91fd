//! Line disambiguation and selection.

use inbound_core::{OrderLine, Origin};

use super::session::{Focus, LotState, Picker, ResolutionSession};
use crate::error::ReceivingError;

/// What to do with the lines of a resolved origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDecision {
    /// Select the only line without asking.
    AutoSelect(OrderLine),
    /// Let the operator pick.
    Pick {
        /// Candidate lines.
        lines: Vec<OrderLine>,
        /// Whether the picker opens by itself.
        open: bool,
    },
    /// Nothing to pick from.
    Nothing,
}

/// Decide between auto-selection and a picker.
#[must_use]
pub fn decide_line(mut lines: Vec<OrderLine>, auto_open: bool, suppress_autofill: bool) -> LineDecision {
    match lines.len() {
        0 => LineDecision::Nothing,
        1 if !suppress_autofill => lines
            .pop()
            .map_or(LineDecision::Nothing, LineDecision::AutoSelect),
        1 => LineDecision::Pick { lines, open: false },
        _ => LineDecision::Pick {
            lines,
            open: auto_open,
        },
    }
}

impl ResolutionSession {
    /// Apply the candidate lines of the resolved origin.
    pub(crate) fn on_line_candidates(mut self, lines: Vec<OrderLine>) -> (Self, Option<OrderLine>) {
        self.last_resolved_key = Some(self.current_key());
        match decide_line(lines, self.auto_open_picker, self.suppress_line_autofill) {
            LineDecision::AutoSelect(line) => {
                let next = self.select_line(line.clone());
                (next, Some(line))
            }
            LineDecision::Pick { lines, open } => {
                self.picker = match self.picker {
                    Picker::OriginLines { groups, .. } => Picker::OriginLines { groups, open },
                    _ => Picker::Lines { lines, open },
                };
                self.focus = Focus::Line;
                (self, None)
            }
            LineDecision::Nothing => {
                self.picker = Picker::Hidden;
                self.focus = Focus::Line;
                (self, None)
            }
        }
    }

    /// Populate the session from a selected line.
    ///
    /// Quantity is prefilled with what is still expected; lot state starts
    /// over for the new item. Switching to a different line invalidates
    /// outstanding line and lot requests.
    #[must_use]
    pub fn select_line(mut self, line: OrderLine) -> Self {
        if self.selected.as_ref() != Some(&line) {
            self.guard_mut().touch_line();
            self.guard_mut().touch_lot();
        }
        self.line = line.line.to_string();
        self.origin = Some(line.origin);
        self.quantity = line.to_be_received_qty.normalize().to_string();
        self.lots = LotState::default();
        self.picker = self.picker.closed();
        self.suppress_line_autofill = false;
        self.selected = Some(line);
        self.last_resolved_key = Some(self.current_key());
        self.focus = Focus::Quantity;
        self
    }

    /// The operator picked a line from the picker.
    ///
    /// A line that is not a candidate of the current lookup is refused with
    /// `ReceivingError::ValidationRejected`.
    pub fn choose_line(
        self,
        origin: Option<Origin>,
        line: u32,
    ) -> (Self, Result<OrderLine, ReceivingError>) {
        let origin = origin.or(self.origin);
        match self.picker.find(origin, line).cloned() {
            Some(chosen) => (self.select_line(chosen.clone()), Ok(chosen)),
            None => {
                let error = ReceivingError::ValidationRejected(format!("Line {line} is not open"));
                (self, Err(error))
            }
        }
    }

    /// Expand or collapse the line picker.
    #[must_use]
    pub fn with_picker_open(mut self, open: bool) -> Self {
        self.picker = match self.picker {
            Picker::Hidden => Picker::Hidden,
            Picker::Lines { lines, .. } => Picker::Lines { lines, open },
            Picker::OriginLines { groups, .. } => Picker::OriginLines { groups, open },
        };
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use inbound_core::{ItemCode, OrderNumber};
    use rust_decimal::Decimal;

    use super::*;
    use crate::engine::GuardScope;
    use crate::engine::lookup::LookupOutcome;

    fn line(number: u32) -> OrderLine {
        OrderLine {
            order: OrderNumber::new("4711"),
            line: number,
            item: ItemCode::new(format!("ITM-{number}")),
            item_description: format!("Item {number}"),
            to_be_received_qty: Decimal::new(2500, 2),
            order_unit: "kg".to_string(),
            origin: Origin::Transfer,
            buy_from_business_partner: None,
        }
    }

    #[test]
    fn test_single_line_auto_selected() {
        assert_eq!(decide_line(vec![line(10)], true, false), LineDecision::AutoSelect(line(10)));
    }

    #[test]
    fn test_single_line_not_autofilled_after_clear() {
        assert_eq!(
            decide_line(vec![line(10)], true, true),
            LineDecision::Pick {
                lines: vec![line(10)],
                open: false
            }
        );
    }

    #[test]
    fn test_several_lines_open_picker_when_allowed() {
        let decision = decide_line(vec![line(10), line(20)], true, false);
        assert!(matches!(decision, LineDecision::Pick { open: true, .. }));
        let decision = decide_line(vec![line(10), line(20)], false, false);
        assert!(matches!(decision, LineDecision::Pick { open: false, .. }));
    }

    #[test]
    fn test_no_lines() {
        assert_eq!(decide_line(Vec::new(), true, false), LineDecision::Nothing);
    }

    #[test]
    fn test_select_line_populates_fields() {
        let session = ResolutionSession::default().with_order("4711").select_line(line(10));
        assert_eq!(session.line, "10");
        assert_eq!(session.item().unwrap().as_str(), "ITM-10");
        assert_eq!(session.item_description(), Some("Item 10"));
        assert_eq!(session.unit(), Some("kg"));
        assert_eq!(session.quantity, "25");
        assert_eq!(session.origin, Some(Origin::Transfer));
        assert_eq!(session.last_resolved_key.as_ref().unwrap().to_string(), "4711|10|transfer");
    }

    #[test]
    fn test_choose_line_from_picker() {
        let session = ResolutionSession::default().with_order("4711");
        let (session, selected) = session.on_lookup(LookupOutcome::Open(vec![line(20), line(10)]));
        assert!(selected.unwrap().is_none());
        assert!(session.picker.is_open());

        let (session, chosen) = session.choose_line(None, 20);
        assert_eq!(chosen.unwrap().line, 20);
        assert_eq!(session.line, "20");
        assert!(!session.picker.is_open());
    }

    #[test]
    fn test_choose_line_not_offered() {
        let session = ResolutionSession::default().with_order("4711");
        let (session, _) = session.on_lookup(LookupOutcome::Open(vec![line(20), line(10)]));
        let (session, result) = session.choose_line(None, 30);
        assert!(result.is_err());
        assert!(session.picker.is_open());
    }

    #[test]
    fn test_switching_line_invalidates_line_tickets() {
        let session = ResolutionSession::default().with_order("4711");
        let (session, _) = session.on_lookup(LookupOutcome::Open(vec![line(20), line(10)]));
        let (session, _) = session.choose_line(None, 10);
        let ticket = session.ticket(GuardScope::Line);

        let (session, _) = session.choose_line(None, 20);
        assert!(!session.is_current(&ticket));
    }

    #[test]
    fn test_reselecting_same_line_keeps_tickets() {
        let session = ResolutionSession::default().with_order("4711").select_line(line(10));
        let ticket = session.ticket(GuardScope::Lot);
        let session = session.select_line(line(10));
        assert!(session.is_current(&ticket));
    }

    #[test]
    fn test_cleared_line_keeps_singleton_in_closed_picker() {
        let session = ResolutionSession::default().with_order("4711");
        let (session, selected) = session.on_lookup(LookupOutcome::Open(vec![line(10)]));
        assert!(selected.unwrap().is_some());

        let session = session.with_line_cleared();
        let (session, selected) = session.on_lookup(LookupOutcome::Open(vec![line(10)]));
        assert!(selected.unwrap().is_none());
        assert!(session.line.is_empty());
        assert!(!session.picker.is_open());
    }
}
