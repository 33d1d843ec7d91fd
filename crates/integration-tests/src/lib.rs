//! Integration tests for Inbound receiving.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p inbound-integration-tests
//! ```
//!
//! The tests drive a [`ReceivingScreen`] against [`FakeErp`], an in-memory
//! ERP that records every call, injects failures on demand and can hold
//! lookups in flight so edits can be interleaved with them.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use inbound_core::{
    BusinessPartnerCode, ConfirmRequest, ExistingLotSet, ItemCode, LotQuery, LotRecord,
    LotRequirement, OrderLine, OrderLineQuery, OrderNumber, Origin, ReceiptAck, ReceiptNumber,
    ReceiptRequest, ReceivedLine, ReceivedLineSet,
};
use inbound_receiving::{ErpConnector, ErpError, ReceivingScreen};
use rust_decimal::Decimal;
use tokio::sync::{Notify, Semaphore};

/// A recorded connector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `lookup_order_lines`
    LookupOrderLines(OrderLineQuery),
    /// `lookup_received_lines`
    LookupReceivedLines(OrderNumber, Origin),
    /// `get_lot_tracking`
    GetLotTracking(ItemCode),
    /// `get_existing_lots`
    GetExistingLots(LotQuery),
    /// `submit_receipt`
    SubmitReceipt(ReceiptRequest),
    /// `confirm_receipt`
    ConfirmReceipt(ConfirmRequest),
    /// `get_runtime_param`
    GetRuntimeParam(String),
}

/// A failure the fake answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The ERP refuses with a message.
    Rejected {
        /// Message.
        message: String,
        /// Details.
        details: Option<String>,
    },
    /// The ERP cannot be reached.
    Unavailable,
}

impl Failure {
    /// Refusal with a message and no details.
    #[must_use]
    pub fn rejected(message: &str) -> Self {
        Self::Rejected {
            message: message.to_string(),
            details: None,
        }
    }

    fn to_error(&self) -> ErpError {
        match self {
            Self::Rejected { message, details } => ErpError::Rejected {
                status: 422,
                message: message.clone(),
                details: details.clone(),
            },
            Self::Unavailable => ErpError::Unavailable("connection refused".to_string()),
        }
    }
}

/// Holds calls in flight until released.
#[derive(Debug)]
struct Gate {
    held: AtomicBool,
    entered: Notify,
    release: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            held: AtomicBool::new(false),
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

impl Gate {
    async fn pass(&self) {
        if !self.held.load(Ordering::SeqCst) {
            return;
        }
        self.entered.notify_one();
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    open_lines: Vec<OrderLine>,
    received: HashMap<(OrderNumber, Origin), Vec<ReceivedLine>>,
    tracked: HashMap<ItemCode, bool>,
    lots: Vec<(LotQuery, LotRecord)>,
    params: HashMap<String, String>,
    submit_failure: Option<Failure>,
    confirm_failure: Option<(usize, Failure)>,
    confirm_calls: usize,
    receipts: usize,
    calls: Vec<Call>,
}

/// In-memory ERP.
///
/// Cheap to clone; clones share state, so a test can keep a handle while
/// the screen owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeErp {
    state: Arc<Mutex<FakeState>>,
    order_gate: Arc<Gate>,
    lot_gate: Arc<Gate>,
}

impl FakeErp {
    /// Empty ERP.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add open order lines.
    #[must_use]
    pub fn with_open_lines(self, lines: impl IntoIterator<Item = OrderLine>) -> Self {
        self.state().open_lines.extend(lines);
        self
    }

    /// Add received lines for an order and origin.
    #[must_use]
    pub fn with_received(
        self,
        order: &str,
        origin: Origin,
        lines: impl IntoIterator<Item = ReceivedLine>,
    ) -> Self {
        self.state()
            .received
            .entry((OrderNumber::new(order), origin))
            .or_default()
            .extend(lines);
        self
    }

    /// Mark an item as lot-tracked.
    #[must_use]
    pub fn with_tracked_item(self, item: &str) -> Self {
        self.state().tracked.insert(ItemCode::new(item), true);
        self
    }

    /// Add an existing lot.
    #[must_use]
    pub fn with_lot(
        self,
        item: &str,
        origin: Origin,
        business_partner: Option<&str>,
        record: LotRecord,
    ) -> Self {
        let scope = LotQuery {
            item: ItemCode::new(item),
            origin,
            business_partner: business_partner.map(BusinessPartnerCode::new),
            lot: None,
        };
        self.state().lots.push((scope, record));
        self
    }

    /// Define a runtime parameter.
    #[must_use]
    pub fn with_param(self, name: &str, value: &str) -> Self {
        self.state().params.insert(name.to_string(), value.to_string());
        self
    }

    /// Fail every receipt submission.
    pub fn fail_submit(&self, failure: Failure) {
        self.state().submit_failure = Some(failure);
    }

    /// Fail the `n`-th confirmation call (1-based).
    pub fn fail_confirm_call(&self, n: usize, failure: Failure) {
        self.state().confirm_failure = Some((n, failure));
    }

    /// Every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Number of calls matching `predicate`.
    #[must_use]
    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Received lines currently waiting for an order and origin.
    #[must_use]
    pub fn received_count(&self, order: &str, origin: Origin) -> usize {
        self.state()
            .received
            .get(&(OrderNumber::new(order), origin))
            .map_or(0, Vec::len)
    }

    /// Hold order-line lookups until [`FakeErp::release_order_lookup`].
    pub fn hold_order_lookups(&self) {
        self.order_gate.held.store(true, Ordering::SeqCst);
    }

    /// Wait until a held order-line lookup is in flight.
    pub async fn order_lookup_started(&self) {
        self.order_gate.entered.notified().await;
    }

    /// Let one held order-line lookup complete.
    pub fn release_order_lookup(&self) {
        self.order_gate.release.add_permits(1);
    }

    /// Hold existing-lot lookups until [`FakeErp::release_lot_lookup`].
    pub fn hold_lot_lookups(&self) {
        self.lot_gate.held.store(true, Ordering::SeqCst);
    }

    /// Wait until a held existing-lot lookup is in flight.
    pub async fn lot_lookup_started(&self) {
        self.lot_gate.entered.notified().await;
    }

    /// Let one held existing-lot lookup complete.
    pub fn release_lot_lookup(&self) {
        self.lot_gate.release.add_permits(1);
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl ErpConnector for FakeErp {
    async fn lookup_order_lines(&self, query: &OrderLineQuery) -> Result<Vec<OrderLine>, ErpError> {
        self.record(Call::LookupOrderLines(query.clone()));
        self.order_gate.pass().await;
        let lines = self
            .state()
            .open_lines
            .iter()
            .filter(|l| l.order == query.order)
            .filter(|l| query.line.is_none_or(|n| n == l.line))
            .filter(|l| query.origin.is_none_or(|o| o == l.origin))
            .cloned()
            .collect();
        Ok(lines)
    }

    async fn lookup_received_lines(
        &self,
        order: &OrderNumber,
        origin: Origin,
    ) -> Result<ReceivedLineSet, ErpError> {
        self.record(Call::LookupReceivedLines(order.clone(), origin));
        let lines = self
            .state()
            .received
            .get(&(order.clone(), origin))
            .cloned()
            .unwrap_or_default();
        Ok(ReceivedLineSet {
            count: lines.len(),
            lines,
        })
    }

    async fn get_lot_tracking(&self, item: &ItemCode) -> Result<LotRequirement, ErpError> {
        self.record(Call::GetLotTracking(item.clone()));
        let tracked = self.state().tracked.get(item).copied().unwrap_or(false);
        Ok(LotRequirement { tracked })
    }

    async fn get_existing_lots(&self, query: &LotQuery) -> Result<ExistingLotSet, ErpError> {
        self.record(Call::GetExistingLots(query.clone()));
        self.lot_gate.pass().await;
        let lots: Vec<LotRecord> = self
            .state()
            .lots
            .iter()
            .filter(|(scope, _)| scope.item == query.item && scope.origin == query.origin)
            .filter(|(scope, _)| {
                query.business_partner.is_none() || scope.business_partner == query.business_partner
            })
            .filter(|(_, record)| query.lot.as_ref().is_none_or(|lot| *lot == record.lot))
            .map(|(_, record)| record.clone())
            .collect();
        Ok(ExistingLotSet {
            count: lots.len(),
            lots,
        })
    }

    async fn submit_receipt(&self, request: &ReceiptRequest) -> Result<ReceiptAck, ErpError> {
        self.record(Call::SubmitReceipt(request.clone()));
        let mut state = self.state();
        if let Some(failure) = &state.submit_failure {
            return Err(failure.to_error());
        }

        state.receipts += 1;
        let receipt_number = ReceiptNumber::new(format!("R-{:04}", state.receipts));
        let origin = state
            .open_lines
            .iter()
            .find(|l| l.order == request.order && l.line == request.position)
            .map_or(Origin::Purchase, |l| l.origin);
        let item = state
            .open_lines
            .iter()
            .find(|l| l.order == request.order && l.line == request.position)
            .map(|l| l.item.clone())
            .unwrap_or_default();
        let line = ReceivedLine {
            transaction_id: format!("TX-{}", state.receipts),
            etag: None,
            order: request.order.clone(),
            position: request.position,
            sequence: request.sequence,
            set: request.set,
            packing_slip: request.packing_slip.clone(),
            item,
            quantity: request.quantity,
            unit: request.unit.clone(),
            lot: request.lot.clone(),
            business_partner_lot: request.business_partner_lot.clone(),
            receipt_number: Some(receipt_number.clone()),
            receipt_line: Some(1),
        };
        state
            .received
            .entry((request.order.clone(), origin))
            .or_default()
            .push(line);

        Ok(ReceiptAck {
            receipt_number: Some(receipt_number),
            receipt_line: Some(1),
        })
    }

    async fn confirm_receipt(&self, request: &ConfirmRequest) -> Result<(), ErpError> {
        self.record(Call::ConfirmReceipt(request.clone()));
        let mut state = self.state();
        state.confirm_calls += 1;
        if let Some((n, failure)) = &state.confirm_failure {
            if *n == state.confirm_calls {
                return Err(failure.to_error());
            }
        }

        let lines = state
            .received
            .entry((request.order.clone(), request.origin))
            .or_default();
        lines.retain(|line| match &request.transaction_id {
            Some(id) => line.transaction_id != *id,
            None => line.receipt_number != request.receipt_number,
        });
        Ok(())
    }

    async fn get_runtime_param(&self, name: &str) -> Result<Option<String>, ErpError> {
        self.record(Call::GetRuntimeParam(name.to_string()));
        Ok(self.state().params.get(name).cloned())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// An open order line expecting 12 pieces.
#[must_use]
pub fn open_line(order: &str, line: u32, origin: Origin, item: &str) -> OrderLine {
    OrderLine {
        order: OrderNumber::new(order),
        line,
        item: ItemCode::new(item),
        item_description: format!("Item {item}"),
        to_be_received_qty: Decimal::new(12, 0),
        order_unit: "pcs".to_string(),
        origin,
        buy_from_business_partner: None,
    }
}

/// An open purchase line bought from `business_partner`.
#[must_use]
pub fn purchase_line(order: &str, line: u32, item: &str, business_partner: Option<&str>) -> OrderLine {
    OrderLine {
        buy_from_business_partner: business_partner.map(BusinessPartnerCode::new),
        ..open_line(order, line, Origin::Purchase, item)
    }
}

/// A received, unconfirmed line.
#[must_use]
pub fn received_line(order: &str, position: u32) -> ReceivedLine {
    ReceivedLine {
        transaction_id: format!("TX-{order}-{position}"),
        etag: Some(format!("etag-{position}")),
        order: OrderNumber::new(order),
        position,
        sequence: 1,
        set: 1,
        packing_slip: "DN-100".to_string(),
        item: ItemCode::new("ITM-R"),
        quantity: Decimal::new(3, 0),
        unit: "pcs".to_string(),
        lot: None,
        business_partner_lot: None,
        receipt_number: Some(ReceiptNumber::new(format!("R-{position}"))),
        receipt_line: Some(1),
    }
}

/// An existing lot record.
#[must_use]
pub fn lot(code: &str, business_partner_lot: Option<&str>) -> LotRecord {
    LotRecord {
        lot: code.to_string(),
        business_partner_lot: business_partner_lot.map(str::to_string),
    }
}

/// A screen over `erp` probing origins in declaration order.
#[must_use]
pub fn screen(erp: &FakeErp) -> ReceivingScreen<FakeErp> {
    ReceivingScreen::new(erp.clone(), Origin::ALL.to_vec())
}
