//! Offline scan parsing.

use inbound_core::parse_scan;

use super::CliError;
use crate::render;

/// Print the order and line encoded in `scan`.
///
/// # Errors
///
/// Returns `CliError::InvalidScan` when the code holds no line.
pub fn run(scan: &str) -> Result<(), CliError> {
    let code = parse_scan(scan).ok_or_else(|| CliError::InvalidScan(scan.to_string()))?;
    render::scan(&code);
    Ok(())
}
