//! HTTP zero-shot classifier adapter.
//!
//! Thin wrapper around a hosted zero-shot classification endpoint: POST the
//! text sample plus candidate labels, get scored labels back. Transport and
//! status failures surface as `ClassifierUnavailable`; retrying is the
//! pipeline's decision.

use super::{ClassificationResult, Classifier, RankedLabel};
use crate::error::{OrganizerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    parameters: CandidateLabels<'a>,
}

#[derive(Debug, Serialize)]
struct CandidateLabels<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    labels: Vec<String>,
    scores: Vec<f32>,
}

/// Zero-shot classifier backed by an HTTP inference endpoint.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    candidate_labels: Vec<String>,
    model_version: String,
}

impl HttpClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        candidate_labels: Vec<String>,
        model_version: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            candidate_labels,
            model_version: model_version.into(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let request = ClassifyRequest {
            inputs: text,
            parameters: CandidateLabels {
                candidate_labels: &self.candidate_labels,
            },
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OrganizerError::ClassifierUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Classifier endpoint returned error");
            return Err(OrganizerError::ClassifierUnavailable(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| OrganizerError::ClassifierUnavailable(format!("bad response: {}", e)))?;

        let labels = parsed
            .labels
            .into_iter()
            .zip(parsed.scores)
            .map(|(category, confidence)| RankedLabel {
                category,
                confidence,
            })
            .collect();

        Ok(ClassificationResult::new(labels, self.model_version.clone()))
    }
}
