//! Stale request protection.
//!
//! Every async step takes a [`Ticket`] before it awaits the ERP. Edits to the
//! fields a step depends on bump a generation counter, and a ticket is only
//! honoured while the generations it captured are unchanged. Setting a field
//! back to its original value mid-flight still bumps the counter, so the
//! late result is discarded.

/// Which fields a request depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardScope {
    /// The order number.
    Order,
    /// The order number and line.
    Line,
    /// The order number, line and typed lot.
    Lot,
}

/// Generations captured when a request started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    scope: GuardScope,
    order: u64,
    line: u64,
    lot: u64,
}

impl Ticket {
    /// Scope the ticket was taken for.
    #[must_use]
    pub const fn scope(&self) -> GuardScope {
        self.scope
    }
}

/// Generation counters for the fields async steps depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaleRequestGuard {
    order: u64,
    line: u64,
    lot: u64,
}

impl StaleRequestGuard {
    /// Record an edit of the order number.
    pub const fn touch_order(&mut self) {
        self.order += 1;
    }

    /// Record an edit of the line.
    pub const fn touch_line(&mut self) {
        self.line += 1;
    }

    /// Record an edit of the lot.
    pub const fn touch_lot(&mut self) {
        self.lot += 1;
    }

    /// Invalidate every outstanding ticket.
    pub const fn touch_all(&mut self) {
        self.touch_order();
        self.touch_line();
        self.touch_lot();
    }

    /// Take a ticket for a request depending on `scope`.
    #[must_use]
    pub const fn ticket(&self, scope: GuardScope) -> Ticket {
        Ticket {
            scope,
            order: self.order,
            line: self.line,
            lot: self.lot,
        }
    }

    /// Whether a result obtained with `ticket` may still be applied.
    #[must_use]
    pub const fn is_current(&self, ticket: &Ticket) -> bool {
        let order = ticket.order == self.order;
        match ticket.scope {
            GuardScope::Order => order,
            GuardScope::Line => order && ticket.line == self.line,
            GuardScope::Lot => order && ticket.line == self.line && ticket.lot == self.lot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ticket_is_current() {
        let guard = StaleRequestGuard::default();
        let ticket = guard.ticket(GuardScope::Line);
        assert!(guard.is_current(&ticket));
    }

    #[test]
    fn test_order_edit_invalidates_every_scope() {
        let mut guard = StaleRequestGuard::default();
        let tickets = [
            guard.ticket(GuardScope::Order),
            guard.ticket(GuardScope::Line),
            guard.ticket(GuardScope::Lot),
        ];
        guard.touch_order();
        for ticket in &tickets {
            assert!(!guard.is_current(ticket), "{:?}", ticket.scope());
        }
    }

    #[test]
    fn test_line_edit_keeps_order_tickets() {
        let mut guard = StaleRequestGuard::default();
        let order_ticket = guard.ticket(GuardScope::Order);
        let line_ticket = guard.ticket(GuardScope::Line);
        guard.touch_line();
        assert!(guard.is_current(&order_ticket));
        assert!(!guard.is_current(&line_ticket));
    }

    #[test]
    fn test_lot_edit_only_affects_lot_tickets() {
        let mut guard = StaleRequestGuard::default();
        let line_ticket = guard.ticket(GuardScope::Line);
        let lot_ticket = guard.ticket(GuardScope::Lot);
        guard.touch_lot();
        assert!(guard.is_current(&line_ticket));
        assert!(!guard.is_current(&lot_ticket));
    }

    #[test]
    fn test_touch_all_invalidates_everything() {
        let mut guard = StaleRequestGuard::default();
        let ticket = guard.ticket(GuardScope::Order);
        guard.touch_all();
        assert!(!guard.is_current(&ticket));
    }
}
