//! HTTP clients for the checkout worker and the demo store catalog.
//!
//! The orchestrator talks to the worker through the [`WorkerApi`] trait so
//! tests can script responses without a socket. [`HttpWorkerApi`] is the
//! real implementation over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{PurchaseRequest, PurchaseStatus, PurchaseSubmission, StoreProduct};

/// Failures raised by the worker and catalog clients.
///
/// `Rejected` is a business refusal carried in a `detail` body; the other
/// variants are transport or contract problems. All of them are flattened
/// to their display string before classification.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("{detail}")]
    Rejected { detail: String },
    #[error("network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },
    #[error("{endpoint} returned unexpected status {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },
    #[error("could not decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
    #[error("could not build http client: {0}")]
    Client(String),
}

/// The checkout worker's two endpoints: submit a purchase, poll its record.
#[async_trait]
pub trait WorkerApi: Send + Sync {
    async fn submit_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseSubmission, TransportError>;

    async fn purchase_status(&self, purchase_id: &str) -> Result<PurchaseStatus, TransportError>;
}

/// Read-only view of the demo store's product list.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn products(&self) -> Result<Vec<StoreProduct>, TransportError>;
}

/// Error body shape used by the worker for rejected submissions.
#[derive(Debug, Deserialize)]
struct DetailBody {
    detail: String,
}

pub struct HttpWorkerApi {
    http: Client,
    base_url: String,
}

impl HttpWorkerApi {
    /// `submit_timeout` bounds the submission call; the worker answers it
    /// quickly with a purchase id and does the real work in the
    /// background.
    pub fn new(base_url: impl Into<String>, submit_timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(submit_timeout)
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;

        Ok(Self { http, base_url: trim_base(base_url) })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl WorkerApi for HttpWorkerApi {
    async fn submit_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseSubmission, TransportError> {
        let endpoint = self.endpoint("/api/browser-checkout");
        debug!(endpoint = %endpoint, user_id = %request.user_id, "submitting purchase");

        let response = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| network_error(&endpoint, err))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            // Rejections carry {"detail": "..."}; fall back to the raw
            // body when the shape does not match.
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<DetailBody>(&body)
                .map(|parsed| parsed.detail)
                .unwrap_or(body);
            if detail.is_empty() {
                return Err(TransportError::UnexpectedStatus { endpoint, status });
            }
            return Err(TransportError::Rejected { detail });
        }

        response
            .json::<PurchaseSubmission>()
            .await
            .map_err(|err| decode_error(&endpoint, err))
    }

    async fn purchase_status(&self, purchase_id: &str) -> Result<PurchaseStatus, TransportError> {
        let endpoint = self.endpoint(&format!("/api/purchase-status/{purchase_id}"));

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|err| network_error(&endpoint, err))?;

        if !response.status().is_success() {
            return Err(TransportError::UnexpectedStatus {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        response.json::<PurchaseStatus>().await.map_err(|err| decode_error(&endpoint, err))
    }
}

pub struct HttpCatalogApi {
    http: Client,
    base_url: String,
}

impl HttpCatalogApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;

        Ok(Self { http, base_url: trim_base(base_url) })
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn products(&self) -> Result<Vec<StoreProduct>, TransportError> {
        let endpoint = format!("{}/api/products", self.base_url);

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|err| network_error(&endpoint, err))?;

        if !response.status().is_success() {
            return Err(TransportError::UnexpectedStatus {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        response.json::<Vec<StoreProduct>>().await.map_err(|err| decode_error(&endpoint, err))
    }
}

fn trim_base(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

fn network_error(endpoint: &str, err: reqwest::Error) -> TransportError {
    TransportError::Network { endpoint: endpoint.to_string(), message: err.to_string() }
}

fn decode_error(endpoint: &str, err: reqwest::Error) -> TransportError {
    TransportError::Decode { endpoint: endpoint.to_string(), message: err.to_string() }
}
