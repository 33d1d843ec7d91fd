//! The resolution engine.
//!
//! Flow of a receipt:
//!
//! 1. [`lookup`] queries open lines, falling back to received lines.
//! 2. [`origin`] groups candidates by origin.
//! 3. [`line`] auto-selects a single line or offers a picker.
//! 4. [`lots`] fetches the lot requirement and existing lots.
//! 5. [`submission`] sends the receipt (and its confirmation).
//! 6. [`received`] lists and confirms received lines.
//!
//! The async functions here never touch a session. Callers stamp a
//! [`Ticket`] before awaiting them and apply the result through the matching
//! session transition only if the ticket is still current.

pub mod guard;
pub mod line;
pub mod lookup;
pub mod lots;
pub mod origin;
pub mod received;
pub mod session;
pub mod submission;

pub use guard::{GuardScope, StaleRequestGuard, Ticket};
pub use line::{LineDecision, decide_line};
pub use lookup::{LookupOutcome, lookup, probe_sequence};
pub use lots::{LotCheck, LotResolution, LotValidation, existing_lot_scope, resolve_lots, validate_lot};
pub use origin::{OriginResolution, disambiguate_origin};
pub use received::{
    BulkConfirmReport, ReceivedLinesTracker, confirm_all, confirm_received_line,
    fetch_received_lines,
};
pub use session::{Focus, LotState, Picker, ResolutionSession, ResolvedKey};
pub use submission::{CONFIRM_ONLY_PARAM, ReceiptDraft, SubmissionMode, submit};
