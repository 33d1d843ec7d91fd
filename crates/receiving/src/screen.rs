//! The receiving screen.
//!
//! [`ReceivingScreen`] owns the live [`ResolutionSession`] and turns operator
//! events into engine steps. Every async step follows the same shape:
//!
//! 1. lock the session, take a [`Ticket`] and copy out what the step needs
//! 2. release the lock and await the connector
//! 3. lock again and apply the result only if the ticket is still current
//!
//! Several steps may be in flight at once; results land in completion order
//! and superseded ones are dropped. Every failure ends up as a
//! [`Notification`].

use inbound_core::{OrderLineQuery, OrderNumber, Origin, parse_scan};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::engine::{
    self, CONFIRM_ONLY_PARAM, GuardScope, ResolutionSession, SubmissionMode, Ticket,
};
use crate::erp::ErpConnector;
use crate::error::ReceivingError;
use crate::notification::{Notification, NotificationLevel};

/// One receiving screen bound to an ERP connector.
pub struct ReceivingScreen<C> {
    id: Uuid,
    connector: C,
    probe_order: Vec<Origin>,
    session: Mutex<ResolutionSession>,
}

impl<C> std::fmt::Debug for ReceivingScreen<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceivingScreen")
            .field("id", &self.id)
            .field("probe_order", &self.probe_order)
            .finish_non_exhaustive()
    }
}

impl<C: ErpConnector> ReceivingScreen<C> {
    /// Create a screen with an empty session.
    ///
    /// `probe_order` lists the origins tried for received lines when an
    /// order has no open lines.
    pub fn new(connector: C, probe_order: Vec<Origin>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connector,
            probe_order,
            session: Mutex::new(ResolutionSession::default()),
        }
    }

    /// Screen instance id, recorded on every span.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The ERP connector.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Copy of the live session for rendering.
    pub async fn snapshot(&self) -> ResolutionSession {
        self.session.lock().await.clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// The screen was entered; read the submission mode.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn mount(&self) -> Option<Notification> {
        self.refresh_mode().await
    }

    /// The screen became visible again; the submission mode may have changed.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn regain_focus(&self) -> Option<Notification> {
        self.refresh_mode().await
    }

    /// The operator navigated away; outstanding results are dropped.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn leave(&self) {
        self.apply(ResolutionSession::left).await;
    }

    async fn refresh_mode(&self) -> Option<Notification> {
        match self.connector.get_runtime_param(CONFIRM_ONLY_PARAM).await {
            Ok(value) => {
                let mode = SubmissionMode::from_param(value.as_deref());
                debug!(?mode, "Submission mode");
                self.apply(|s| s.with_mode(mode)).await;
                None
            }
            Err(e) => Some(ReceivingError::Network(e).into_notification()),
        }
    }

    // =========================================================================
    // Order and line
    // =========================================================================

    /// The order field was edited.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn edit_order(&self, text: &str) {
        self.apply(|s| s.with_order(text)).await;
    }

    /// A scan or paste arrived in the order field; resolves immediately.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn paste(&self, raw: &str) -> Option<Notification> {
        match parse_scan(raw) {
            Some(code) => self.apply(|s| s.with_scan(&code)).await,
            None => self.apply(|s| s.with_order(raw.trim())).await,
        }
        self.resolve().await
    }

    /// The line field was edited.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn edit_line(&self, text: &str) {
        self.apply(|s| s.with_line(text)).await;
    }

    /// The operator cleared the line.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn clear_line(&self) {
        self.apply(ResolutionSession::with_line_cleared).await;
    }

    /// Expand or collapse the picker.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn toggle_picker(&self, open: bool) {
        self.apply(|s| s.with_picker_open(open)).await;
    }

    /// Resolve the current order and line against the ERP.
    ///
    /// Does nothing when the same triple was already resolved.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn resolve(&self) -> Option<Notification> {
        let (ticket, query) = {
            let session = self.session.lock().await;
            if !session.needs_lookup() {
                return None;
            }
            let line = session.line.trim();
            let line = if line.is_empty() {
                None
            } else {
                match line.parse::<u32>() {
                    Ok(line) => Some(line),
                    Err(_) => {
                        let error =
                            ReceivingError::ValidationRejected(format!("Line {line} is not a number"));
                        return Some(error.into_notification());
                    }
                }
            };
            let query = OrderLineQuery {
                order: OrderNumber::new(session.order.trim()),
                line,
                origin: session.origin,
            };
            (session.ticket(GuardScope::Line), query)
        };

        let outcome = engine::lookup(&self.connector, &query, &self.probe_order).await;
        let applied = self
            .apply_if_current(&ticket, |s| match outcome {
                Ok(outcome) => s.on_lookup(outcome),
                Err(e) => (s.on_lookup_failed(&e), Err(e)),
            })
            .await;

        match applied {
            Some(Ok(Some(_))) => self.resolve_lots().await,
            other => finish(other.map(|r| r.map(|_| ()))),
        }
    }

    /// The operator picked an origin group.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn choose_origin(&self, origin: Origin) -> Option<Notification> {
        match self.update(|s| s.choose_origin(origin)).await {
            Ok(Some(_)) => self.resolve_lots().await,
            Ok(None) => None,
            Err(e) => Some(e.into_notification()),
        }
    }

    /// The operator picked a line.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn choose_line(&self, origin: Option<Origin>, line: u32) -> Option<Notification> {
        match self.update(|s| s.choose_line(origin, line)).await {
            Ok(_) => self.resolve_lots().await,
            Err(e) => Some(e.into_notification()),
        }
    }

    // =========================================================================
    // Lots
    // =========================================================================

    async fn resolve_lots(&self) -> Option<Notification> {
        let (ticket, target) = {
            let session = self.session.lock().await;
            (session.ticket(GuardScope::Line), session.lot_target())
        };
        let (line, cached) = target?;

        let result = engine::resolve_lots(&self.connector, &line, cached).await;
        let applied = self
            .apply_if_current(&ticket, |s| match result {
                Ok(resolution) => (s.on_lot_resolution(resolution), Ok(())),
                Err(e) => (s, Err(e)),
            })
            .await;
        finish(applied)
    }

    /// The lot field was edited.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn edit_lot(&self, text: &str) {
        self.apply(|s| s.with_lot(text)).await;
    }

    /// The lot field lost focus; a typed lot is checked against the ERP.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn blur_lot(&self) -> Option<Notification> {
        let (ticket, check) = {
            let session = self.session.lock().await;
            (session.ticket(GuardScope::Lot), session.lot_check())
        };
        let check = check?;

        let result = engine::validate_lot(&self.connector, &check).await;
        let applied = self
            .apply_if_current(&ticket, |s| match result {
                Ok(validation) => s.on_lot_validation(&check, validation),
                Err(e) => (s, Err(e)),
            })
            .await;
        finish(applied)
    }

    /// The operator picked an existing lot.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn choose_existing_lot(&self, index: usize) -> Option<Notification> {
        finish(Some(self.update(|s| s.choose_existing_lot(index)).await))
    }

    /// The supplier lot field was edited.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn edit_business_partner_lot(&self, text: &str) {
        self.apply(|s| s.with_business_partner_lot(text)).await;
    }

    // =========================================================================
    // Receipt
    // =========================================================================

    /// The delivery note field was edited.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn edit_delivery_note(&self, text: &str) {
        self.apply(|s| s.with_delivery_note(text)).await;
    }

    /// The quantity field was edited.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn edit_quantity(&self, text: &str) {
        self.apply(|s| s.with_quantity(text)).await;
    }

    /// Submit the receipt.
    ///
    /// A typed but unchecked lot is validated first. While a submission is
    /// in flight further submits do nothing.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn submit(&self) -> Option<Notification> {
        let unchecked_lot = self.session.lock().await.lot_check().is_some();
        if unchecked_lot {
            if let Some(notification) = self.blur_lot().await {
                return Some(notification);
            }
        }

        let (ticket, draft, mode) = {
            let mut session = self.session.lock().await;
            if session.submitting {
                debug!("Submission already in flight");
                return None;
            }
            let draft = match session.receipt_draft() {
                Ok(draft) => draft,
                Err(e) => return Some(e.into_notification()),
            };
            let next = std::mem::take(&mut *session).begin_submission();
            *session = next;
            (session.ticket(GuardScope::Order), draft, session.mode)
        };

        let result = engine::submit(&self.connector, mode, &draft).await;

        let refresh = {
            let mut session = self.session.lock().await;
            let current = std::mem::take(&mut *session);
            match (&result, current.is_current(&ticket)) {
                (Ok(_), true) => {
                    *session = current.after_submission();
                    session.received_known()
                }
                (Ok(_), false) => {
                    debug!("Order changed during submission, keeping new input");
                    *session = current.end_submission();
                    false
                }
                (Err(_), _) => {
                    *session = current.end_submission();
                    false
                }
            }
        };

        match result {
            Ok(ack) => {
                if refresh {
                    self.refresh_received_quietly().await;
                }
                let verb = match mode {
                    SubmissionMode::TwoPhase => "Received",
                    SubmissionMode::ConfirmOnly => "Received and confirmed",
                };
                let receipt = &draft.receipt;
                let success = Notification::success(format!(
                    "{verb} {} {} on order {} line {}",
                    receipt.quantity, receipt.unit, receipt.order, receipt.position
                ))
                .with_details(ack.receipt_number.map(|n| format!("Receipt {n}")));
                Some(success)
            }
            Err(e) => Some(e.into_notification()),
        }
    }

    // =========================================================================
    // Received lines
    // =========================================================================

    /// Open the received-lines panel, refreshing it first.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn open_received_lines(&self) -> Option<Notification> {
        if let Some(notification) = self.refresh_received().await {
            return Some(notification);
        }
        let open = {
            let mut session = self.session.lock().await;
            let next = std::mem::take(&mut *session).with_received_panel(true);
            *session = next;
            session.received.open
        };
        (!open).then(|| Notification::new(NotificationLevel::Info, "No received lines to confirm"))
    }

    /// Close the received-lines panel.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn close_received_lines(&self) {
        self.apply(|s| s.with_received_panel(false)).await;
    }

    /// Confirm one received line by its position in the panel.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn confirm_received(&self, index: usize) -> Option<Notification> {
        let entry = self.session.lock().await.received_line(index);
        let Some((origin, line)) = entry else {
            let error = ReceivingError::ValidationRejected(format!("No received line #{}", index + 1));
            return Some(error.into_notification());
        };

        let result = engine::confirm_received_line(&self.connector, origin, &line).await;
        self.refresh_received_quietly().await;
        match result {
            Ok(()) => Some(Notification::success(format!("Confirmed line {}", line.position))),
            Err(e) => Some(e.into_notification()),
        }
    }

    /// Confirm every listed received line, stopping at the first failure.
    #[instrument(skip(self), fields(screen = %self.id))]
    pub async fn confirm_all_received(&self) -> Option<Notification> {
        let (origin, lines) = {
            let session = self.session.lock().await;
            (session.received.origin, session.received.lines().to_vec())
        };
        let Some(origin) = origin.filter(|_| !lines.is_empty()) else {
            return Some(Notification::new(
                NotificationLevel::Info,
                "No received lines to confirm",
            ));
        };

        let report = engine::confirm_all(&self.connector, origin, &lines).await;
        self.refresh_received_quietly().await;
        let message = format!("Confirmed {report} received lines");
        if report.is_complete() {
            return Some(Notification::success(message));
        }
        let details = report.failure.map(|e| e.into_notification().to_string());
        Some(Notification::new(NotificationLevel::Error, message).with_details(details))
    }

    /// Refresh after a receipt or confirmation; the outcome of that action
    /// is what the operator is told about.
    async fn refresh_received_quietly(&self) {
        if let Some(notification) = self.refresh_received().await {
            debug!(%notification, "Received lines not refreshed");
        }
    }

    async fn refresh_received(&self) -> Option<Notification> {
        let (ticket, scope) = {
            let session = self.session.lock().await;
            (session.ticket(GuardScope::Order), session.received_scope())
        };
        let (order, origin) = scope?;

        let result = engine::fetch_received_lines(&self.connector, &order, origin).await;
        let applied = self
            .apply_if_current(&ticket, |s| match result {
                Ok(lines) if s.received_scope() == Some((order.clone(), origin)) => {
                    (s.on_received_lines(order, origin, lines), Ok(()))
                }
                Ok(_) => (s, Ok(())),
                Err(e) => (s, Err(e)),
            })
            .await;
        finish(applied)
    }

    // =========================================================================
    // Session plumbing
    // =========================================================================

    async fn apply(&self, transition: impl FnOnce(ResolutionSession) -> ResolutionSession) {
        self.update(|s| (transition(s), ())).await;
    }

    async fn update<R>(
        &self,
        transition: impl FnOnce(ResolutionSession) -> (ResolutionSession, R),
    ) -> R {
        let mut session = self.session.lock().await;
        let (next, out) = transition(std::mem::take(&mut *session));
        *session = next;
        out
    }

    async fn apply_if_current<R>(
        &self,
        ticket: &Ticket,
        transition: impl FnOnce(ResolutionSession) -> (ResolutionSession, R),
    ) -> Option<R> {
        let mut session = self.session.lock().await;
        if !session.is_current(ticket) {
            debug!(scope = ?ticket.scope(), "Discarding stale result");
            return None;
        }
        let (next, out) = transition(std::mem::take(&mut *session));
        *session = next;
        Some(out)
    }
}

fn finish(result: Option<Result<(), ReceivingError>>) -> Option<Notification> {
    match result {
        Some(Err(e)) => Some(e.into_notification()),
        Some(Ok(())) | None => None,
    }
}
