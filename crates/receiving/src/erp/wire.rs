//! JSON envelopes exchanged with the ERP HTTP binding.

use inbound_core::OrderLine;
use serde::Deserialize;

/// Response body of an open order line lookup.
#[derive(Debug, Deserialize)]
pub(super) struct OrderLinesResponse {
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

/// Response body of a runtime parameter read.
#[derive(Debug, Deserialize)]
pub(super) struct RuntimeParamResponse {
    #[serde(default)]
    pub value: Option<String>,
}

/// Response body of a confirmation.
#[derive(Debug, Deserialize)]
pub(super) struct ConfirmResponse {
    #[serde(default = "default_ok")]
    pub ok: bool,
}

const fn default_ok() -> bool {
    true
}

/// Error body the ERP sends with non-success statuses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_lines_response_parses_lines() {
        let body = r#"{
            "lines": [{
                "order": "200000066",
                "line": 10,
                "item": "ITM-1",
                "itemDescription": "Bolt M8",
                "toBeReceivedQty": "12.5",
                "orderUnit": "pcs",
                "origin": "purchase",
                "buyFromBusinessPartner": "SUP001"
            }]
        }"#;
        let parsed: OrderLinesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.lines.len(), 1);
        let line = &parsed.lines[0];
        assert_eq!(line.order.as_str(), "200000066");
        assert_eq!(line.line, 10);
        assert_eq!(line.to_be_received_qty.to_string(), "12.5");
        assert_eq!(
            line.buy_from_business_partner.as_ref().map(|bp| bp.as_str()),
            Some("SUP001")
        );
    }

    #[test]
    fn test_missing_lines_is_empty() {
        let parsed: OrderLinesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.lines.is_empty());
    }

    #[test]
    fn test_confirm_response_defaults_to_ok() {
        let parsed: ConfirmResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.ok);
    }

    #[test]
    fn test_error_body_details_optional() {
        let parsed: ErrorBody = serde_json::from_str(r#"{"message":"Order closed"}"#).unwrap();
        assert_eq!(parsed.message, "Order closed");
        assert!(parsed.details.is_none());
    }
}
