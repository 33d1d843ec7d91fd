//! Origin disambiguation.

use std::collections::BTreeMap;

use inbound_core::{OrderLine, OrderNumber, Origin};

use super::lookup::LookupOutcome;
use super::received::ReceivedLinesTracker;
use super::session::{Focus, Picker, ResolutionSession};
use crate::error::ReceivingError;

/// How the origin of a candidate set was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginResolution {
    /// All candidates share one origin.
    Single {
        /// The shared origin.
        origin: Origin,
        /// The candidates.
        lines: Vec<OrderLine>,
    },
    /// Candidates span several origins; the operator has to choose.
    Multiple {
        /// Candidates per origin, every origin present in the input.
        groups: BTreeMap<Origin, Vec<OrderLine>>,
    },
}

/// Group candidate lines by origin.
///
/// # Errors
///
/// Returns `ReceivingError::NotFound` for an empty candidate set.
pub fn disambiguate_origin(lines: Vec<OrderLine>) -> Result<OriginResolution, ReceivingError> {
    let mut groups: BTreeMap<Origin, Vec<OrderLine>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.origin).or_default().push(line);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|line| line.line);
    }

    if groups.len() > 1 {
        return Ok(OriginResolution::Multiple { groups });
    }
    groups
        .pop_first()
        .map(|(origin, lines)| OriginResolution::Single { origin, lines })
        .ok_or_else(|| ReceivingError::NotFound("candidate lines".to_string()))
}

impl ResolutionSession {
    /// Apply a lookup result.
    ///
    /// Yields the line that was auto-selected, if any, so the caller can
    /// continue with lot resolution. A result without lines is reported as
    /// `ReceivingError::NotFound`.
    pub fn on_lookup(
        mut self,
        outcome: LookupOutcome,
    ) -> (Self, Result<Option<OrderLine>, ReceivingError>) {
        match outcome {
            LookupOutcome::ReceivedOnly { origin, received } => {
                self.origin = Some(origin);
                self.origin_locked = true;
                self.origin_choice_required = false;
                self.selected = None;
                self.picker = Picker::Hidden;
                let order = OrderNumber::new(self.order.trim());
                self.received = ReceivedLinesTracker::loaded(order, origin, received);
                self.last_resolved_key = Some(self.current_key());
                self.focus = Focus::Order;
                (self, Ok(None))
            }
            LookupOutcome::Open(lines) => match disambiguate_origin(lines) {
                Ok(OriginResolution::Single { origin, lines }) => {
                    self.origin = Some(origin);
                    self.origin_locked = true;
                    self.origin_choice_required = false;
                    let (next, selected) = self.on_line_candidates(lines);
                    (next, Ok(selected))
                }
                Ok(OriginResolution::Multiple { groups }) => {
                    self.origin = None;
                    self.origin_locked = false;
                    self.origin_choice_required = true;
                    self.selected = None;
                    self.picker = Picker::OriginLines {
                        groups,
                        open: self.auto_open_picker,
                    };
                    self.last_resolved_key = Some(self.current_key());
                    self.focus = Focus::Line;
                    (self, Ok(None))
                }
                Err(e) => (self.on_lookup_failed(&e), Err(e)),
            },
        }
    }

    /// A lookup failed; the session is kept and a missing order is offered
    /// for re-scan.
    #[must_use]
    pub fn on_lookup_failed(mut self, error: &ReceivingError) -> Self {
        if matches!(error, ReceivingError::NotFound(_)) {
            self.focus = Focus::Order;
        }
        self
    }

    /// The operator picked an origin group from the combined picker.
    ///
    /// The group's lines go through line disambiguation. Origins that are
    /// not offered, or a locked origin, are refused with
    /// `ReceivingError::ValidationRejected`.
    pub fn choose_origin(mut self, origin: Origin) -> (Self, Result<Option<OrderLine>, ReceivingError>) {
        if self.origin_locked {
            let error = ReceivingError::ValidationRejected(format!(
                "Origin is fixed to {}",
                self.origin.map_or("", Origin::label)
            ));
            return (self, Err(error));
        }
        let Some(lines) = self.picker.lines_for(origin).map(<[OrderLine]>::to_vec) else {
            let error = ReceivingError::ValidationRejected(format!(
                "No open lines for origin {}",
                origin.label()
            ));
            return (self, Err(error));
        };

        self.origin = Some(origin);
        self.selected = None;
        let (next, selected) = self.on_line_candidates(lines);
        (next, Ok(selected))
    }
}
