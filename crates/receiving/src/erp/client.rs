//! JSON-over-HTTP ERP connector.
//!
//! Resource layout, relative to the configured base URL:
//!
//! | Operation            | Request                                 |
//! |----------------------|-----------------------------------------|
//! | open order lines     | `GET orders/{order}/lines`              |
//! | received lines       | `GET orders/{order}/received-lines`     |
//! | lot tracking         | `GET items/{item}/lot-tracking`         |
//! | existing lots        | `GET items/{item}/lots`                 |
//! | create receipt       | `POST receipts`                         |
//! | confirm receipt      | `POST receipts/confirmations`           |
//! | runtime parameter    | `GET parameters/{name}`                 |

use std::sync::Arc;

use async_trait::async_trait;
use inbound_core::{
    ConfirmRequest, ExistingLotSet, ItemCode, LotQuery, LotRequirement, OrderLine,
    OrderLineQuery, OrderNumber, Origin, ReceiptAck, ReceiptRequest, ReceivedLineSet,
};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::wire::{ConfirmResponse, ErrorBody, OrderLinesResponse, RuntimeParamResponse};
use super::{ErpConnector, ErpError};
use crate::config::ErpConfig;

/// Header carrying the ERP company the operator works in.
const COMPANY_HEADER: &str = "X-Company";

/// ERP HTTP client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HttpErpConnector {
    inner: Arc<HttpErpConnectorInner>,
}

struct HttpErpConnectorInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: SecretString,
    company: String,
    language: String,
}

impl std::fmt::Debug for HttpErpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpErpConnector")
            .field("base_url", &self.inner.base_url.as_str())
            .field("company", &self.inner.company)
            .field("language", &self.inner.language)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl HttpErpConnector {
    /// Create a connector from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Http` if the HTTP client cannot be built and
    /// `ErpError::InvalidUrl` if the base URL cannot carry resource paths.
    pub fn new(config: &ErpConfig) -> Result<Self, ErpError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ErpError::InvalidUrl(config.base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpErpConnectorInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                company: config.company.clone(),
                language: config.language.clone(),
            }),
        })
    }

    /// Build a resource URL from path segments and query pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ErpError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ErpError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.api_token.expose_secret())
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.inner.language)
            .header(COMPANY_HEADER, &self.inner.company)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ErpError> {
        let response = self.request(reqwest::Method::GET, url).send().await?;
        read_response(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ErpError> {
        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await?;
        read_response(response).await
    }
}

/// Map the status and decode the body of an ERP response.
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ErpError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ErpError::NotFound(response.url().path().to_string()));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "ERP returned error status");
        return Err(match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => ErpError::Rejected {
                status: status.as_u16(),
                message: error.message,
                details: error.details,
            },
            Err(_) => ErpError::Status(status.as_u16()),
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl ErpConnector for HttpErpConnector {
    #[instrument(skip(self), fields(order = %query.order, line = ?query.line, origin = ?query.origin))]
    async fn lookup_order_lines(&self, query: &OrderLineQuery) -> Result<Vec<OrderLine>, ErpError> {
        let line = query.line.map(|line| line.to_string());
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(line) = line.as_deref() {
            params.push(("line", line));
        }
        if let Some(origin) = query.origin {
            params.push(("origin", origin.as_str()));
        }

        let url = self.endpoint(&["orders", query.order.as_str(), "lines"], &params)?;
        let response: OrderLinesResponse = self.get_json(url).await?;
        Ok(response.lines)
    }

    #[instrument(skip(self), fields(order = %order, origin = %origin))]
    async fn lookup_received_lines(
        &self,
        order: &OrderNumber,
        origin: Origin,
    ) -> Result<ReceivedLineSet, ErpError> {
        let url = self.endpoint(
            &["orders", order.as_str(), "received-lines"],
            &[("origin", origin.as_str())],
        )?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(item = %item))]
    async fn get_lot_tracking(&self, item: &ItemCode) -> Result<LotRequirement, ErpError> {
        let url = self.endpoint(&["items", item.as_str(), "lot-tracking"], &[])?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(item = %query.item, origin = %query.origin))]
    async fn get_existing_lots(&self, query: &LotQuery) -> Result<ExistingLotSet, ErpError> {
        let mut params: Vec<(&str, &str)> = vec![("origin", query.origin.as_str())];
        if let Some(partner) = &query.business_partner {
            params.push(("businessPartner", partner.as_str()));
        }
        if let Some(lot) = query.lot.as_deref() {
            params.push(("lot", lot));
        }

        let url = self.endpoint(&["items", query.item.as_str(), "lots"], &params)?;
        self.get_json(url).await
    }

    #[instrument(skip(self, request), fields(order = %request.order, position = request.position))]
    async fn submit_receipt(&self, request: &ReceiptRequest) -> Result<ReceiptAck, ErpError> {
        let url = self.endpoint(&["receipts"], &[])?;
        self.post_json(url, request).await
    }

    #[instrument(skip(self, request), fields(order = %request.order, position = request.position))]
    async fn confirm_receipt(&self, request: &ConfirmRequest) -> Result<(), ErpError> {
        let url = self.endpoint(&["receipts", "confirmations"], &[])?;
        let response: ConfirmResponse = self.post_json(url, request).await?;
        if response.ok {
            Ok(())
        } else {
            Err(ErpError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: "Confirmation was not accepted".to_string(),
                details: None,
            })
        }
    }

    #[instrument(skip(self))]
    async fn get_runtime_param(&self, name: &str) -> Result<Option<String>, ErpError> {
        let url = self.endpoint(&["parameters", name], &[])?;
        match self.get_json::<RuntimeParamResponse>(url).await {
            Ok(response) => Ok(response.value),
            Err(ErpError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base_url: &str) -> ErpConfig {
        ErpConfig {
            base_url: base_url.parse().unwrap(),
            api_token: SecretString::from("tok_9fQ2xLm4Zr8Wv1Bn"),
            company: "100".to_string(),
            language: "en-US".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = HttpErpConnector::new(&config("https://erp.example.com/api/v1/")).unwrap();
        let url = client
            .endpoint(&["orders", "200000066", "lines"], &[("line", "10")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://erp.example.com/api/v1/orders/200000066/lines?line=10"
        );
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let client = HttpErpConnector::new(&config("https://erp.example.com/api")).unwrap();
        let url = client.endpoint(&["receipts"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://erp.example.com/api/receipts");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = HttpErpConnector::new(&config("https://erp.example.com/")).unwrap();
        let url = client.endpoint(&["items", "BOLT/M8", "lots"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://erp.example.com/items/BOLT%2FM8/lots");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = HttpErpConnector::new(&config("https://erp.example.com/")).unwrap();
        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_9fQ2xLm4Zr8Wv1Bn"));
    }

    #[test]
    fn test_rejects_cannot_be_a_base_url() {
        let result = HttpErpConnector::new(&config("mailto:erp@example.com"));
        assert!(matches!(result, Err(ErpError::InvalidUrl(_))));
    }
}
