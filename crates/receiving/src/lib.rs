//! Inbound Receiving library.
//!
//! Resolves scanned or keyed order codes against the ERP, disambiguates
//! origins and lines, validates lot requirements and submits receipts with
//! their confirmations.
//!
//! # Architecture
//!
//! - [`erp`] - the ERP connector trait and its HTTP binding
//! - [`engine`] - the resolution session and its per-component transitions
//! - [`screen`] - the operator-facing driver that sequences async steps and
//!   turns every failure into a [`notification::Notification`]
//!
//! The engine never holds the session across a network call. Each async step
//! stamps a ticket, awaits the connector, and applies the result only when
//! the ticket is still current.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod erp;
pub mod error;
pub mod notification;
pub mod screen;
pub mod telemetry;

pub use engine::ResolutionSession;
pub use erp::{ErpConnector, ErpError, HttpErpConnector};
pub use error::ReceivingError;
pub use notification::{Notification, NotificationLevel};
pub use screen::ReceivingScreen;
