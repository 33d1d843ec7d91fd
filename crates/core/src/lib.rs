//! Inbound Core - Shared types library.
//!
//! This crate provides the domain types used across all Inbound components:
//! - `receiving` - Order/line/lot resolution and receipt confirmation engine
//! - `cli` - Handheld receiving session and received-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Origins, order lines, lots, received lines and receipt requests
//! - [`scan`] - Splitting a scanned code into an order and line number

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod scan;
pub mod types;

pub use scan::{ScanCode, parse_scan};
pub use types::*;
