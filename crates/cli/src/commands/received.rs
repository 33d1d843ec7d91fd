//! Received-lines listing and bulk confirmation.

use inbound_core::{OrderNumber, Origin};
use inbound_receiving::config::ReceivingConfig;
use inbound_receiving::engine::{self, ReceivedLinesTracker};
use inbound_receiving::{HttpErpConnector, ReceivingError};

use super::CliError;
use crate::render;

/// List received lines of `order`, optionally confirming all of them.
///
/// # Errors
///
/// Returns `CliError` when the ERP cannot be reached, or when a confirmation
/// fails; lines confirmed before the failure stay confirmed.
pub async fn run(
    config: &ReceivingConfig,
    order: &str,
    origin: Origin,
    confirm_all: bool,
) -> Result<(), CliError> {
    let connector = HttpErpConnector::new(&config.erp)?;
    let order = OrderNumber::new(order);

    let lines = engine::fetch_received_lines(&connector, &order, origin).await?;
    render::received_lines(&ReceivedLinesTracker::loaded(order.clone(), origin, lines.clone()));

    if !confirm_all || lines.is_empty() {
        return Ok(());
    }

    let report = engine::confirm_all(&connector, origin, &lines.lines).await;
    tracing::info!(%order, %origin, confirmed = %report, "Confirm all finished");

    let remaining = engine::fetch_received_lines(&connector, &order, origin).await?;
    render::received_lines(&ReceivedLinesTracker::loaded(order, origin, remaining));

    match report.failure {
        Some(ReceivingError::Confirm { message, details }) => Err(ReceivingError::Confirm {
            message: format!("{message} (confirmed {}/{})", report.confirmed, report.total),
            details,
        }
        .into()),
        Some(other) => Err(other.into()),
        None => Ok(()),
    }
}
