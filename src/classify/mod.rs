//! Classifier adapter contract and result types.
//!
//! The classifier is a black box to the pipeline: it maps a text sample to a
//! ranked list of (category, confidence) pairs. Two implementations ship with
//! the crate: a deterministic keyword-indicator classifier that works offline,
//! and an HTTP zero-shot classifier for a hosted model. Retry around the call
//! belongs to the pipeline, not to implementations.

mod http;
mod keyword;

pub use http::HttpClassifier;
pub use keyword::KeywordClassifier;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One candidate category with the classifier's certainty in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedLabel {
    pub category: String,
    /// 0.0 - 1.0
    pub confidence: f32,
}

/// Ranked classifier output. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Labels sorted descending by confidence.
    pub labels: Vec<RankedLabel>,
    /// Identifier of the model that produced the labels.
    pub model_version: String,
}

impl ClassificationResult {
    /// Build a result, enforcing the descending-confidence ordering.
    pub fn new(mut labels: Vec<RankedLabel>, model_version: impl Into<String>) -> Self {
        labels.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            labels,
            model_version: model_version.into(),
        }
    }

    /// A result with no candidates (classifier abstained).
    pub fn empty(model_version: impl Into<String>) -> Self {
        Self {
            labels: Vec::new(),
            model_version: model_version.into(),
        }
    }

    /// Highest-confidence label, if any.
    pub fn top(&self) -> Option<&RankedLabel> {
        self.labels.first()
    }
}

/// Maps a text sample to ranked category labels.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the sample. Fails with `ClassifierUnavailable` when the
    /// model or its transport is down; never silently mis-categorizes.
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;
}
