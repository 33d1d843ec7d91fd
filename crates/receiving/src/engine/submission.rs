//! Receipt submission.
//!
//! # Modes
//!
//! - Two-phase: the receipt is created and confirmed later from the
//!   received-lines panel.
//! - Confirm-only: the receipt is created unconfirmed and confirmed right
//!   away. When the confirmation fails the receipt stays on the ERP side
//!   unconfirmed; the failure carries its receipt number so it can be
//!   confirmed from the received-lines panel. Nothing is retried.

use inbound_core::{ConfirmRequest, OrderNumber, Origin, ReceiptAck, ReceiptRequest};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::received::ReceivedLinesTracker;
use super::session::{Focus, ResolutionSession};
use crate::erp::ErpConnector;
use crate::error::ReceivingError;

/// Name of the runtime parameter selecting confirm-only mode.
pub const CONFIRM_ONLY_PARAM: &str = "confirmOnly";

/// How receipts are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Receive now, confirm later.
    #[default]
    TwoPhase,
    /// Receive and confirm back-to-back.
    ConfirmOnly,
}

impl SubmissionMode {
    /// Mode for a `confirmOnly` parameter value; unset means two-phase.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("true" | "yes" | "1") => Self::ConfirmOnly,
            _ => Self::TwoPhase,
        }
    }
}

/// A receipt ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDraft {
    /// Origin of the received line.
    pub origin: Origin,
    /// The receipt request.
    pub receipt: ReceiptRequest,
}

/// Receive (and in confirm-only mode confirm) a draft.
///
/// # Errors
///
/// Returns `ReceivingError::Receipt` or `ReceivingError::Confirm` with the
/// server message when the ERP refuses, `ReceivingError::Network` otherwise.
#[instrument(
    skip(connector, draft),
    fields(order = %draft.receipt.order, position = draft.receipt.position, ?mode)
)]
pub async fn submit<C>(
    connector: &C,
    mode: SubmissionMode,
    draft: &ReceiptDraft,
) -> Result<ReceiptAck, ReceivingError>
where
    C: ErpConnector + ?Sized,
{
    let mut receipt = draft.receipt.clone();
    if mode == SubmissionMode::ConfirmOnly {
        receipt.confirm = Some(false);
    }

    let ack = connector
        .submit_receipt(&receipt)
        .await
        .map_err(ReceivingError::receipt)?;
    info!(receipt = ?ack.receipt_number, "Receipt created");

    if mode == SubmissionMode::TwoPhase {
        return Ok(ack);
    }

    let confirm = ConfirmRequest::for_new_receipt(draft.origin, &receipt, &ack);
    if let Err(e) = connector.confirm_receipt(&confirm).await {
        let receipt_number = ack
            .receipt_number
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        warn!(
            receipt = %receipt_number,
            error = %e,
            "Receipt created but not confirmed"
        );
        return Err(match ReceivingError::confirm(e) {
            ReceivingError::Confirm { message, details } => ReceivingError::Confirm {
                message,
                details: Some(unconfirmed_details(&receipt_number, details)),
            },
            other => other,
        });
    }
    info!(receipt = ?ack.receipt_number, "Receipt confirmed");
    Ok(ack)
}

fn unconfirmed_details(receipt_number: &str, details: Option<String>) -> String {
    let note = format!("Receipt {receipt_number} was created but is not confirmed");
    match details {
        Some(details) => format!("{details}; {note}"),
        None => note,
    }
}

impl ResolutionSession {
    /// Switch submission mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: SubmissionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the receipt for the current inputs.
    ///
    /// # Errors
    ///
    /// Returns `ReceivingError::Incomplete` naming the missing inputs.
    pub fn receipt_draft(&self) -> Result<ReceiptDraft, ReceivingError> {
        let missing = self.missing_fields();
        let (Some(line), Some(quantity), true) =
            (self.selected.as_ref(), self.parsed_quantity(), missing.is_empty())
        else {
            return Err(ReceivingError::Incomplete(format!(
                "Missing {}",
                missing.join(", ")
            )));
        };

        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        let lot = if self.lot_visible() {
            optional(&self.lots.lot)
        } else {
            None
        };
        let business_partner_lot = if self.business_partner_lot_visible() {
            optional(&self.lots.business_partner_lot)
        } else {
            None
        };

        Ok(ReceiptDraft {
            origin: line.origin,
            receipt: ReceiptRequest {
                order: OrderNumber::new(self.order.trim()),
                position: line.line,
                sequence: 1,
                set: 1,
                packing_slip: self.delivery_note.trim().to_string(),
                lot,
                business_partner_lot,
                quantity,
                unit: line.order_unit.clone(),
                confirm: None,
            },
        })
    }

    /// Mark a submission in flight.
    #[must_use]
    pub const fn begin_submission(mut self) -> Self {
        self.submitting = true;
        self
    }

    /// The submission finished without resetting; inputs are kept.
    #[must_use]
    pub const fn end_submission(mut self) -> Self {
        self.submitting = false;
        self
    }

    /// A submission succeeded; a fresh session takes over.
    ///
    /// Order, origin and delivery note carry over so the next line of the
    /// same order can be received without re-keying. Pickers stay closed
    /// until the order is edited.
    #[must_use]
    pub fn after_submission(self) -> Self {
        let mut next = Self::new(self.mode);
        *next.guard_mut() = self.guard_snapshot();
        next.guard_mut().touch_line();
        next.guard_mut().touch_lot();

        next.order = self.order;
        next.origin = self.origin;
        next.origin_locked = self.origin_locked;
        next.origin_choice_required = self.origin_choice_required;
        next.delivery_note = self.delivery_note;
        next.received = match self.received {
            tracker @ ReceivedLinesTracker { lines: Some(_), .. } => tracker,
            _ => ReceivedLinesTracker::default(),
        };
        next.auto_open_picker = false;
        next.focus = Focus::Line;
        next
    }
}
