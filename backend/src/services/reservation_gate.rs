//! Reservation gate contract and its remote transport.
//!
//! The order workflow only ever sees [`ReservationGate`]: reserve takes an
//! ordered list of item ids and answers with one flag per id, release gives
//! units back. `CatalogService` implements it in-process;
//! [`HttpReservationGate`] forwards the same calls to a catalog instance
//! over HTTP.

use crate::api::common::ApiResponse;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the shared secret on internal catalog calls.
pub const SERVICE_KEY_HEADER: &str = "x-service-key";

#[async_trait]
pub trait ReservationGate: Send + Sync {
    /// Takes one unit per listed id. The result is position-aligned with
    /// `item_ids`; `false` means the unit was unavailable and nothing changed.
    async fn reserve(&self, item_ids: &[String]) -> ServiceResult<Vec<bool>>;

    /// Gives back one unit per listed id.
    async fn release(&self, item_ids: &[String]) -> ServiceResult<()>;
}

/// Body of the internal reserve/release endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub item_ids: Vec<String>,
}

/// Reply of the internal reserve endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub successful: Vec<bool>,
}

/// Reservation gate living in another process, reached over HTTP.
pub struct HttpReservationGate {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpReservationGate {
    pub fn new(base_url: &str, service_key: &str, timeout_ms: u64) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ServiceError::internal_error(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    async fn post(&self, path: &str, item_ids: &[String]) -> ServiceResult<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(SERVICE_KEY_HEADER, &self.service_key)
            .json(&ReservationRequest {
                item_ids: item_ids.to_vec(),
            })
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("Catalog unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::external_service(format!(
                "Catalog replied {} to {}",
                response.status(),
                path
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ReservationGate for HttpReservationGate {
    async fn reserve(&self, item_ids: &[String]) -> ServiceResult<Vec<bool>> {
        let response = self.post("/internal/catalog/reserve", item_ids).await?;
        let body: ApiResponse<ReservationResponse> = response.json().await.map_err(|e| {
            ServiceError::external_service(format!("Malformed catalog reply: {}", e))
        })?;

        let successful = body
            .data
            .map(|data| data.successful)
            .ok_or_else(|| ServiceError::external_service("Catalog reply carried no data"))?;

        if successful.len() != item_ids.len() {
            return Err(ServiceError::external_service(format!(
                "Catalog answered {} flags for {} items",
                successful.len(),
                item_ids.len()
            )));
        }

        Ok(successful)
    }

    async fn release(&self, item_ids: &[String]) -> ServiceResult<()> {
        self.post("/internal/catalog/release", item_ids).await?;
        Ok(())
    }
}
