//! The resolution session.
//!
//! One [`ResolutionSession`] is live per receiving screen. Operator edits and
//! ERP results are applied through transitions that consume the session and
//! return the next one; the transitions for each engine component live next
//! to that component (`origin`, `line`, `lots`, `submission`, `received`).

use std::collections::BTreeMap;

use inbound_core::{ExistingLotSet, ItemCode, LotQuery, LotRequirement, OrderLine, Origin, ScanCode};
use rust_decimal::Decimal;
use serde::Serialize;

use super::guard::{GuardScope, StaleRequestGuard, Ticket};
use super::received::ReceivedLinesTracker;
use super::submission::SubmissionMode;

/// Input the operator is expected to fill next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    /// Order number (scan target).
    #[default]
    Order,
    /// Line number.
    Line,
    /// Internal lot code.
    Lot,
    /// Supplier lot code.
    BusinessPartnerLot,
    /// Delivery note / packing slip.
    DeliveryNote,
    /// Quantity.
    Quantity,
}

/// Candidate picker shown when the operator has to choose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Picker {
    /// Nothing to choose.
    #[default]
    Hidden,
    /// Lines of one origin.
    Lines {
        /// Candidate lines, ascending by line number.
        lines: Vec<OrderLine>,
        /// Whether the picker is currently expanded.
        open: bool,
    },
    /// Lines grouped by origin; choosing a line also chooses its origin.
    OriginLines {
        /// Candidate lines per origin.
        groups: BTreeMap<Origin, Vec<OrderLine>>,
        /// Whether the picker is currently expanded.
        open: bool,
    },
}

impl Picker {
    /// Whether the picker is expanded.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        match self {
            Self::Hidden => false,
            Self::Lines { open, .. } | Self::OriginLines { open, .. } => *open,
        }
    }

    /// Whether the operator has to pick an origin before a line.
    #[must_use]
    pub const fn offers_origins(&self) -> bool {
        matches!(self, Self::OriginLines { .. })
    }

    /// Collapse the picker, keeping its candidates.
    #[must_use]
    pub fn closed(self) -> Self {
        match self {
            Self::Hidden => Self::Hidden,
            Self::Lines { lines, .. } => Self::Lines { lines, open: false },
            Self::OriginLines { groups, .. } => Self::OriginLines {
                groups,
                open: false,
            },
        }
    }

    /// Find a candidate line.
    #[must_use]
    pub fn find(&self, origin: Option<Origin>, line: u32) -> Option<&OrderLine> {
        let matches = |candidate: &&OrderLine| {
            candidate.line == line && origin.is_none_or(|o| o == candidate.origin)
        };
        match self {
            Self::Hidden => None,
            Self::Lines { lines, .. } => lines.iter().find(matches),
            Self::OriginLines { groups, .. } => groups.values().flatten().find(matches),
        }
    }

    /// Candidate lines of one origin.
    #[must_use]
    pub fn lines_for(&self, origin: Origin) -> Option<&[OrderLine]> {
        match self {
            Self::Hidden => None,
            Self::Lines { lines, .. } => {
                (lines.first().map(|l| l.origin) == Some(origin)).then_some(lines.as_slice())
            }
            Self::OriginLines { groups, .. } => groups.get(&origin).map(Vec::as_slice),
        }
    }
}

/// The `order|line|origin` triple of the last successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedKey {
    /// Order number.
    pub order: String,
    /// Line text.
    pub line: String,
    /// Origin, when known.
    pub origin: Option<Origin>,
}

impl std::fmt::Display for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = self.origin.map_or("", Origin::as_str);
        write!(f, "{}|{}|{origin}", self.order, self.line)
    }
}

/// Lot fields of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotState {
    /// Lot requirement of the selected item, once known.
    pub requirement: Option<LotRequirement>,
    /// Scope of the existing-lot lookup, `None` when lookup is gated.
    pub scope: Option<LotQuery>,
    /// Existing lots for the scope.
    pub existing: ExistingLotSet,
    /// Typed or chosen lot code.
    pub lot: String,
    /// Typed or chosen supplier lot code.
    pub business_partner_lot: String,
    /// Whether the lot was validated or chosen from the existing lots.
    pub accepted: bool,
}

impl LotState {
    /// Whether the selected item is lot-tracked.
    #[must_use]
    pub fn tracked(&self) -> bool {
        self.requirement.is_some_and(|r| r.tracked)
    }
}

/// State of one receiving screen.
///
/// Fields are public so a snapshot can be rendered; the live session is only
/// changed through its transitions.
#[derive(Debug, Clone)]
pub struct ResolutionSession {
    /// Order number as typed or scanned.
    pub order: String,
    /// Line number as typed, scanned or selected.
    pub line: String,
    /// Resolved or chosen origin.
    pub origin: Option<Origin>,
    /// Origin was resolved without operator choice and is read-only.
    pub origin_locked: bool,
    /// The candidates spanned several origins.
    pub origin_choice_required: bool,
    /// Selected order line.
    pub selected: Option<OrderLine>,
    /// Quantity as typed, prefilled from the selected line.
    pub quantity: String,
    /// Delivery note / packing slip.
    pub delivery_note: String,
    /// Lot fields.
    pub lots: LotState,
    /// Candidate picker.
    pub picker: Picker,
    /// Input to focus next.
    pub focus: Focus,
    /// Memo used to skip redundant lookups.
    pub last_resolved_key: Option<ResolvedKey>,
    /// Whether a picker may open by itself after a lookup.
    pub auto_open_picker: bool,
    /// Do not auto-fill a singleton line the operator just cleared.
    pub suppress_line_autofill: bool,
    /// Received lines of the current order and origin.
    pub received: ReceivedLinesTracker,
    /// Submission mode in effect.
    pub mode: SubmissionMode,
    /// A submission is in flight.
    pub submitting: bool,
    pub(crate) lot_requirement_cache: Option<(ItemCode, LotRequirement)>,
    guard: StaleRequestGuard,
}

impl Default for ResolutionSession {
    fn default() -> Self {
        Self::new(SubmissionMode::default())
    }
}

impl ResolutionSession {
    /// Create an empty session.
    #[must_use]
    pub fn new(mode: SubmissionMode) -> Self {
        Self {
            order: String::new(),
            line: String::new(),
            origin: None,
            origin_locked: false,
            origin_choice_required: false,
            selected: None,
            quantity: String::new(),
            delivery_note: String::new(),
            lots: LotState::default(),
            picker: Picker::Hidden,
            focus: Focus::Order,
            last_resolved_key: None,
            auto_open_picker: true,
            suppress_line_autofill: false,
            received: ReceivedLinesTracker::default(),
            mode,
            submitting: false,
            lot_requirement_cache: None,
            guard: StaleRequestGuard::default(),
        }
    }

    // =========================================================================
    // Stale request protection
    // =========================================================================

    /// Take a ticket for an async step depending on `scope`.
    #[must_use]
    pub const fn ticket(&self, scope: GuardScope) -> Ticket {
        self.guard.ticket(scope)
    }

    /// Whether a result obtained with `ticket` may still be applied.
    #[must_use]
    pub const fn is_current(&self, ticket: &Ticket) -> bool {
        self.guard.is_current(ticket)
    }

    pub(crate) const fn guard_mut(&mut self) -> &mut StaleRequestGuard {
        &mut self.guard
    }

    pub(crate) fn guard_snapshot(&self) -> StaleRequestGuard {
        self.guard.clone()
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// The triple the session would resolve right now.
    #[must_use]
    pub fn current_key(&self) -> ResolvedKey {
        ResolvedKey {
            order: self.order.trim().to_string(),
            line: self.line.trim().to_string(),
            origin: self.origin,
        }
    }

    /// Whether resolving now would query the ERP.
    #[must_use]
    pub fn needs_lookup(&self) -> bool {
        !self.order.trim().is_empty()
            && self.last_resolved_key.as_ref() != Some(&self.current_key())
    }

    /// Item of the selected line.
    #[must_use]
    pub fn item(&self) -> Option<&ItemCode> {
        self.selected.as_ref().map(|line| &line.item)
    }

    /// Item description of the selected line.
    #[must_use]
    pub fn item_description(&self) -> Option<&str> {
        self.selected.as_ref().map(|line| line.item_description.as_str())
    }

    /// Order unit of the selected line.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.selected.as_ref().map(|line| line.order_unit.as_str())
    }

    /// Quantity still expected on the selected line.
    #[must_use]
    pub fn to_be_received_qty(&self) -> Option<Decimal> {
        self.selected.as_ref().map(|line| line.to_be_received_qty)
    }

    /// Typed quantity, when it is a positive number.
    #[must_use]
    pub fn parsed_quantity(&self) -> Option<Decimal> {
        self.quantity
            .trim()
            .replace(',', ".")
            .parse::<Decimal>()
            .ok()
            .filter(|q| q.is_sign_positive() && !q.is_zero())
    }

    /// Whether lot fields are shown.
    #[must_use]
    pub fn lot_visible(&self) -> bool {
        self.lots.tracked()
    }

    /// Whether the supplier lot field is shown and required.
    #[must_use]
    pub fn business_partner_lot_visible(&self) -> bool {
        self.lots.tracked()
            && self.lots.accepted
            && self
                .origin
                .is_some_and(Origin::requires_business_partner_lot)
    }

    /// Inputs still preventing submission.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.order.trim().is_empty() {
            missing.push("order");
        }
        if self.origin_choice_required && self.origin.is_none() {
            missing.push("origin");
        }
        if self.line.trim().is_empty() {
            missing.push("line");
        }
        if self.selected.is_none() {
            missing.push("item");
        }
        if self.lot_visible() && self.lots.lot.trim().is_empty() {
            missing.push("lot");
        }
        if self.business_partner_lot_visible() && self.lots.business_partner_lot.trim().is_empty()
        {
            missing.push("business partner lot");
        }
        if self.delivery_note.trim().is_empty() {
            missing.push("delivery note");
        }
        if self.parsed_quantity().is_none() {
            missing.push("quantity");
        }
        missing
    }

    /// Whether the submit action is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.submitting && self.missing_fields().is_empty()
    }

    // =========================================================================
    // Operator edits
    // =========================================================================

    /// The order number was typed or edited.
    ///
    /// Everything derived from the previous order is dropped and pickers may
    /// open by themselves again.
    #[must_use]
    pub fn with_order(mut self, text: &str) -> Self {
        self.guard.touch_order();
        self.order = text.to_string();
        self.line.clear();
        self.origin = None;
        self.origin_locked = false;
        self.origin_choice_required = false;
        self.selected = None;
        self.quantity.clear();
        self.lots = LotState::default();
        self.picker = Picker::Hidden;
        self.last_resolved_key = None;
        self.auto_open_picker = true;
        self.suppress_line_autofill = false;
        self.received = ReceivedLinesTracker::default();
        self.lot_requirement_cache = None;
        self.focus = Focus::Order;
        self
    }

    /// A combined order/line code was scanned or pasted.
    #[must_use]
    pub fn with_scan(self, code: &ScanCode) -> Self {
        let mut next = self.with_order(&code.order);
        next.line.clone_from(&code.line);
        next
    }

    /// The line number was typed or edited.
    #[must_use]
    pub fn with_line(mut self, text: &str) -> Self {
        self.guard.touch_line();
        self.line = text.to_string();
        self.drop_selection();
        self.suppress_line_autofill = false;
        self
    }

    /// The operator explicitly cleared the line.
    ///
    /// A singleton result is not auto-filled again and pickers stay closed
    /// until the order is edited.
    #[must_use]
    pub fn with_line_cleared(mut self) -> Self {
        self.guard.touch_line();
        self.line.clear();
        self.drop_selection();
        self.suppress_line_autofill = true;
        self.auto_open_picker = false;
        self.picker = self.picker.closed();
        self.focus = Focus::Line;
        self
    }

    /// The lot was typed or edited.
    #[must_use]
    pub fn with_lot(mut self, text: &str) -> Self {
        self.guard.touch_lot();
        self.lots.lot = text.to_string();
        self.lots.accepted = false;
        self
    }

    /// The supplier lot was typed or edited.
    #[must_use]
    pub fn with_business_partner_lot(mut self, text: &str) -> Self {
        self.lots.business_partner_lot = text.to_string();
        self
    }

    /// The delivery note was typed or edited.
    #[must_use]
    pub fn with_delivery_note(mut self, text: &str) -> Self {
        self.delivery_note = text.to_string();
        self
    }

    /// The quantity was typed or edited.
    #[must_use]
    pub fn with_quantity(mut self, text: &str) -> Self {
        self.quantity = text.to_string();
        self
    }

    /// The operator left the screen; a fresh session takes over.
    #[must_use]
    pub fn left(self) -> Self {
        let mut next = Self::new(self.mode);
        next.guard = self.guard;
        next.guard.touch_all();
        next
    }

    fn drop_selection(&mut self) {
        self.selected = None;
        self.quantity.clear();
        self.lots = LotState::default();
        self.last_resolved_key = None;
    }
}
