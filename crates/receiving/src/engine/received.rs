//! Received-lines tracking and confirmation.

use inbound_core::{ConfirmRequest, OrderNumber, Origin, ReceivedLine, ReceivedLineSet};
use tracing::{info, instrument, warn};

use super::session::ResolutionSession;
use crate::erp::{ErpConnector, ErpError};
use crate::error::ReceivingError;

/// Received but unconfirmed lines of the current order and origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedLinesTracker {
    /// Order the lines belong to.
    pub order: Option<OrderNumber>,
    /// Origin the lines belong to.
    pub origin: Option<Origin>,
    /// Lines, once fetched.
    pub lines: Option<ReceivedLineSet>,
    /// Whether the panel is open.
    pub open: bool,
}

impl ReceivedLinesTracker {
    /// Tracker holding freshly fetched lines, panel closed.
    #[must_use]
    pub const fn loaded(order: OrderNumber, origin: Origin, lines: ReceivedLineSet) -> Self {
        Self {
            order: Some(order),
            origin: Some(origin),
            lines: Some(lines),
            open: false,
        }
    }

    /// Number of lines, once known.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        self.lines.as_ref().map(|set| set.count)
    }

    /// Count to show on the received-lines badge; `None` hides the badge.
    #[must_use]
    pub fn badge(&self) -> Option<usize> {
        self.count().filter(|count| *count > 0)
    }

    /// Lines currently listed.
    #[must_use]
    pub fn lines(&self) -> &[ReceivedLine] {
        match &self.lines {
            Some(set) => &set.lines,
            None => &[],
        }
    }
}

/// Result of confirming all received lines.
#[derive(Debug)]
pub struct BulkConfirmReport {
    /// Lines confirmed before stopping.
    pub confirmed: usize,
    /// Lines attempted in total.
    pub total: usize,
    /// The failure that stopped the run.
    pub failure: Option<ReceivingError>,
}

impl BulkConfirmReport {
    /// Whether every line was confirmed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none() && self.confirmed == self.total
    }
}

impl std::fmt::Display for BulkConfirmReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.confirmed, self.total)
    }
}

/// Fetch received lines; an unknown order has none.
///
/// # Errors
///
/// Returns `ReceivingError::Network` when the ERP cannot be queried.
#[instrument(skip(connector), fields(order = %order, origin = %origin))]
pub async fn fetch_received_lines<C>(
    connector: &C,
    order: &OrderNumber,
    origin: Origin,
) -> Result<ReceivedLineSet, ReceivingError>
where
    C: ErpConnector + ?Sized,
{
    match connector.lookup_received_lines(order, origin).await {
        Ok(set) => Ok(set),
        Err(ErpError::NotFound(_)) => Ok(ReceivedLineSet::default()),
        Err(e) => Err(ReceivingError::Network(e)),
    }
}

/// Confirm one received line.
///
/// # Errors
///
/// Returns `ReceivingError::Confirm` with the server message when the ERP
/// refuses, `ReceivingError::Network` otherwise.
#[instrument(skip(connector, line), fields(order = %line.order, position = line.position, transaction = %line.transaction_id))]
pub async fn confirm_received_line<C>(
    connector: &C,
    origin: Origin,
    line: &ReceivedLine,
) -> Result<(), ReceivingError>
where
    C: ErpConnector + ?Sized,
{
    connector
        .confirm_receipt(&ConfirmRequest::for_received_line(origin, line))
        .await
        .map_err(ReceivingError::confirm)?;
    info!("Received line confirmed");
    Ok(())
}

/// Confirm lines in order, stopping at the first failure.
#[instrument(skip(connector, lines), fields(total = lines.len()))]
pub async fn confirm_all<C>(connector: &C, origin: Origin, lines: &[ReceivedLine]) -> BulkConfirmReport
where
    C: ErpConnector + ?Sized,
{
    let mut report = BulkConfirmReport {
        confirmed: 0,
        total: lines.len(),
        failure: None,
    };
    for line in lines {
        if let Err(e) = confirm_received_line(connector, origin, line).await {
            warn!(confirmed = report.confirmed, error = %e, "Confirm all stopped");
            report.failure = Some(e);
            break;
        }
        report.confirmed += 1;
    }
    report
}

impl ResolutionSession {
    /// Order and origin received lines can be fetched for.
    #[must_use]
    pub fn received_scope(&self) -> Option<(OrderNumber, Origin)> {
        let order = OrderNumber::new(self.order.trim());
        if order.is_empty() {
            return None;
        }
        self.origin.map(|origin| (order, origin))
    }

    /// Whether a received-lines count is known for the current scope.
    #[must_use]
    pub fn received_known(&self) -> bool {
        self.received.lines.is_some()
            && self
                .received_scope()
                .is_some_and(|(order, origin)| {
                    self.received.order.as_ref() == Some(&order) && self.received.origin == Some(origin)
                })
    }

    /// Apply refreshed received lines; the panel closes when none are left.
    #[must_use]
    pub fn on_received_lines(mut self, order: OrderNumber, origin: Origin, lines: ReceivedLineSet) -> Self {
        let open = self.received.open && !lines.is_empty();
        self.received = ReceivedLinesTracker::loaded(order, origin, lines);
        self.received.open = open;
        self
    }

    /// Open or close the received-lines panel.
    #[must_use]
    pub fn with_received_panel(mut self, open: bool) -> Self {
        self.received.open = open && self.received.badge().is_some();
        self
    }

    /// Origin and line to confirm for a panel entry.
    #[must_use]
    pub fn received_line(&self, index: usize) -> Option<(Origin, ReceivedLine)> {
        let origin = self.received.origin?;
        self.received.lines().get(index).cloned().map(|line| (origin, line))
    }
}
