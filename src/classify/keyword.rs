//! Keyword-indicator classifier.
//!
//! Deterministic, offline scoring over curated indicator phrase lists. Books
//! are checked first and win outright; the remaining document families score
//! by how many of their indicator phrases appear in the sample.

use super::{ClassificationResult, Classifier, RankedLabel};
use crate::error::Result;
use async_trait::async_trait;

const MODEL_VERSION: &str = "keyword-indicators/1";

const BOOK_INDICATORS: &[&str] = &[
    "copyright",
    "published by",
    "publisher",
    "isbn",
    "edition",
    "chapter",
    "table of contents",
    "preface",
    "bibliography",
    "acknowledgments",
];

const RESUME_INDICATORS: &[&str] = &[
    "resume",
    "curriculum vitae",
    "professional experience",
    "work history",
    "work experience",
    "professional summary",
    "education",
    "employment",
];

const COVER_LETTER_INDICATORS: &[&str] = &[
    "cover letter",
    "application letter",
    "motivation letter",
    "hiring manager",
    "job application",
    "dear",
    "sincerely",
];

const PRESENTATION_INDICATORS: &[&str] = &[
    "slide",
    "presentation",
    "powerpoint",
    "keynote",
    "agenda",
    "speaker notes",
];

const FINANCIAL_INDICATORS: &[&str] = &[
    "invoice",
    "receipt",
    "bank statement",
    "financial statement",
    "tax return",
    "balance sheet",
    "income statement",
    "credit report",
];

/// Category families in precedence order for confidence ties.
const FAMILIES: &[(&str, &[&str])] = &[
    ("financial", FINANCIAL_INDICATORS),
    ("resume", RESUME_INDICATORS),
    ("cover_letter", COVER_LETTER_INDICATORS),
    ("presentation", PRESENTATION_INDICATORS),
];

/// Offline classifier built on indicator phrase matching.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn count_hits(haystack: &str, indicators: &[&str]) -> usize {
        indicators.iter().filter(|i| haystack.contains(*i)).count()
    }

    /// Confidence grows with the number of matched phrases, capped below 1.0.
    fn confidence_for(hits: usize) -> f32 {
        (0.55 + 0.1 * hits as f32).min(0.95)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let lower = text.to_lowercase();

        // Book indicators win outright, matching the strongest-signal rule
        // the indicator lists were designed around.
        let book_hits = Self::count_hits(&lower, BOOK_INDICATORS);
        if book_hits >= 2 {
            return Ok(ClassificationResult::new(
                vec![RankedLabel {
                    category: "books".to_string(),
                    confidence: Self::confidence_for(book_hits),
                }],
                MODEL_VERSION,
            ));
        }

        let mut labels = Vec::new();
        for (category, indicators) in FAMILIES {
            let hits = Self::count_hits(&lower, indicators);
            if hits > 0 {
                labels.push(RankedLabel {
                    category: (*category).to_string(),
                    confidence: Self::confidence_for(hits),
                });
            }
        }

        if labels.is_empty() {
            return Ok(ClassificationResult::empty(MODEL_VERSION));
        }
        Ok(ClassificationResult::new(labels, MODEL_VERSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resume_detection() {
        let classifier = KeywordClassifier::new();
        let result = classifier
            .classify("Professional Experience\nEducation\nWork history at Acme Corp")
            .await
            .unwrap();
        assert_eq!(result.top().unwrap().category, "resume");
    }

    #[tokio::test]
    async fn test_book_wins_over_other_signals() {
        let classifier = KeywordClassifier::new();
        let result = classifier
            .classify("Copyright 2020. Table of contents. Chapter 1. The resume of a salesman.")
            .await
            .unwrap();
        assert_eq!(result.labels.len(), 1);
        assert_eq!(result.top().unwrap().category, "books");
    }

    #[tokio::test]
    async fn test_no_indicators_abstains() {
        let classifier = KeywordClassifier::new();
        let result = classifier.classify("lorem ipsum dolor sit amet").await.unwrap();
        assert!(result.labels.is_empty());
    }

    #[tokio::test]
    async fn test_deterministic() {
        let classifier = KeywordClassifier::new();
        let sample = "Invoice #42, bank statement attached. Sincerely, hiring manager.";
        let first = classifier.classify(sample).await.unwrap();
        let second = classifier.classify(sample).await.unwrap();
        assert_eq!(first.labels, second.labels);
    }

    #[tokio::test]
    async fn test_more_hits_raise_confidence() {
        let classifier = KeywordClassifier::new();
        let weak = classifier.classify("an invoice").await.unwrap();
        let strong = classifier
            .classify("invoice receipt balance sheet tax return")
            .await
            .unwrap();
        assert!(strong.top().unwrap().confidence > weak.top().unwrap().confidence);
    }
}
