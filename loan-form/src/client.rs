use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    error::{Result, SubmitError},
    payload::PredictionRequest,
    prediction::PredictionResult,
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/predict";

/// Anything that can turn an applicant payload into a prediction.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult>;
}

/// Posts the payload as JSON to a fixed endpoint.
///
/// One request per call: no timeout, no retry.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpPredictionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpPredictionClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        debug!(endpoint = %self.endpoint, fields = request.0.len(), "Posting prediction request");

        // `json` sets `Content-Type: application/json`.
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| SubmitError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SubmitError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmitError::rejected(status.as_u16(), &body));
        }

        let result: PredictionResult = serde_json::from_slice(&body)
            .map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;

        info!(
            status = %status,
            loan_status = %result.loan_status,
            "Prediction received"
        );

        Ok(result)
    }
}
