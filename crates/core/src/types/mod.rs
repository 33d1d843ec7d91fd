//! Core types for Inbound.
//!
//! This module provides type-safe wrappers for the ERP receiving domain.

pub mod id;
pub mod lot;
pub mod order;
pub mod origin;
pub mod receipt;

pub use id::*;
pub use lot::{ExistingLotSet, LotQuery, LotRecord, LotRequirement};
pub use order::{OrderLine, OrderLineQuery, ReceivedLine, ReceivedLineSet};
pub use origin::{Origin, OriginParseError};
pub use receipt::{ConfirmRequest, ReceiptAck, ReceiptRequest};
