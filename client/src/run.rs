//! Typed wrapper around one run record.

use serde_json::Value;

use runtrack_types::{Hydrate, RunData};

use crate::error::ApiError;
use crate::executor::ApiClient;
use crate::payload::ResponsePayload;
use crate::RUNS_ENDPOINT;

/// One run record bound to the executor that persists it.
///
/// Holds the executor as a collaborator rather than inheriting from it:
/// `data` carries the domain fields, `client` carries the transport.
#[derive(Debug, Clone)]
pub struct RunModel {
    client: ApiClient,
    pub data: RunData,
}

impl RunModel {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            data: RunData::default(),
        }
    }

    /// Construct and hydrate from a server row in one step.
    #[must_use]
    pub fn hydrated(client: ApiClient, row: &Value) -> Self {
        let mut model = Self::new(client);
        model.data.hydrate(row);
        model
    }

    pub fn hydrate(&mut self, row: &Value) -> &mut Self {
        self.data.hydrate(row);
        self
    }

    /// Distance in kilometers to two decimal places.
    #[must_use]
    pub fn distance_km(&self) -> String {
        self.data.distance_km()
    }

    /// Duration as zero-padded `HH:MM:SS`.
    #[must_use]
    pub fn duration_hhmmss(&self) -> String {
        self.data.duration_hhmmss()
    }

    /// Persist this run: update when it already has an identity, create
    /// otherwise. The body is the identity plus every data field except the
    /// server-derived `pace`, with `run_date` normalized to `YYYY-MM-DD`.
    pub async fn save(&self) -> Result<ResponsePayload, ApiError> {
        self.client
            .save(RUNS_ENDPOINT, &self.data.save_body(), self.data.id.is_some())
            .await
    }

    /// Remove this run from the service.
    ///
    /// A run that was never persisted has nothing to delete; that fails
    /// locally without a network call.
    pub async fn delete(&self) -> Result<ResponsePayload, ApiError> {
        let id = self
            .data
            .id
            .ok_or_else(|| ApiError::Validation("run has not been persisted".to_string()))?;

        self.client.delete(&format!("{RUNS_ENDPOINT}{id}")).await
    }
}
