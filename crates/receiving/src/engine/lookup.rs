//! Order lookup with the received-lines fallback.

use inbound_core::{OrderLine, OrderLineQuery, OrderNumber, Origin, ReceivedLineSet};
use tracing::{debug, instrument};

use crate::erp::{ErpConnector, ErpError};
use crate::error::ReceivingError;

/// Result of an order lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Open lines, ascending by line number.
    Open(Vec<OrderLine>),
    /// No open lines, but lines of `origin` were already received.
    ReceivedOnly {
        /// Origin whose probe found received lines.
        origin: Origin,
        /// The received lines found.
        received: ReceivedLineSet,
    },
}

/// Order in which origins are probed: the hint first, then the configured
/// order without the hint.
#[must_use]
pub fn probe_sequence(hint: Option<Origin>, configured: &[Origin]) -> Vec<Origin> {
    hint.into_iter()
        .chain(configured.iter().copied().filter(|o| Some(*o) != hint))
        .collect()
}

/// Look up open lines for `query`, falling back to received lines.
///
/// # Errors
///
/// Returns `ReceivingError::NotFound` when neither open nor received lines
/// exist, or `ReceivingError::Network` when the ERP cannot be queried.
#[instrument(skip(connector, probe_order), fields(order = %query.order, line = ?query.line, origin = ?query.origin))]
pub async fn lookup<C>(
    connector: &C,
    query: &OrderLineQuery,
    probe_order: &[Origin],
) -> Result<LookupOutcome, ReceivingError>
where
    C: ErpConnector + ?Sized,
{
    let mut lines = match connector.lookup_order_lines(query).await {
        Ok(lines) => lines,
        Err(ErpError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(ReceivingError::Network(e)),
    };

    if !lines.is_empty() {
        lines.sort_by_key(|line| line.line);
        debug!(count = lines.len(), "Open lines found");
        return Ok(LookupOutcome::Open(lines));
    }

    for origin in probe_sequence(query.origin, probe_order) {
        let received = probe_received(connector, &query.order, origin).await?;
        if received.count > 0 {
            debug!(%origin, count = received.count, "Order only has received lines");
            return Ok(LookupOutcome::ReceivedOnly { origin, received });
        }
    }

    let mut what = format!("order {}", query.order);
    if let Some(line) = query.line {
        what.push_str(&format!(" line {line}"));
    }
    Err(ReceivingError::NotFound(what))
}

async fn probe_received<C>(
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_sequence_without_hint() {
        assert_eq!(probe_sequence(None, &Origin::ALL), Origin::ALL.to_vec());
    }

    #[test]
    fn test_probe_sequence_hint_first() {
        assert_eq!(
            probe_sequence(Some(Origin::Transfer), &Origin::ALL),
            vec![
                Origin::Transfer,
                Origin::Purchase,
                Origin::Sales,
                Origin::TransferManual,
                Origin::Production,
            ]
        );
    }

    #[test]
    fn test_probe_sequence_hint_outside_configured_list() {
        assert_eq!(
            probe_sequence(Some(Origin::Production), &[Origin::Sales]),
            vec![Origin::Production, Origin::Sales]
        );
    }
}
