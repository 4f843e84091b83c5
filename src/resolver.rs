//! Category Resolver.
//!
//! Maps ranked classifier output to a single filesystem-safe category name.
//! Precedence is strict: confidence threshold first, then the allow-list,
//! then the fallback. Total and deterministic: any input, including an empty
//! label list, yields a non-empty, sanitized category.

use crate::classify::ClassificationResult;
use std::fmt;

/// Longest category name kept after sanitization.
pub const MAX_CATEGORY_LEN: usize = 64;

const ULTIMATE_FALLBACK: &str = "uncategorized";

/// A final, sanitized category. Never empty, never contains path separators
/// or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedCategory(String);

impl ResolvedCategory {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the final category for a classification.
///
/// Walks labels in descending confidence order, skipping those below
/// `min_confidence` and, when `allowed` is non-empty, those outside the
/// allow-list. A label that sanitizes to nothing is treated as disqualified.
/// When no label qualifies, the sanitized fallback is returned.
pub fn resolve(
    classification: &ClassificationResult,
    min_confidence: f32,
    allowed: &[String],
    fallback: &str,
) -> ResolvedCategory {
    for label in &classification.labels {
        if label.confidence < min_confidence {
            // Labels are sorted descending; everything after is lower still.
            break;
        }
        if !allowed.is_empty() && !allowed.iter().any(|a| a == &label.category) {
            continue;
        }
        if let Some(clean) = sanitize(&label.category) {
            tracing::debug!(
                category = %clean,
                confidence = label.confidence,
                "Resolved category"
            );
            return ResolvedCategory(clean);
        }
    }

    let fallback = sanitize(fallback).unwrap_or_else(|| ULTIMATE_FALLBACK.to_string());
    ResolvedCategory(fallback)
}

/// Sanitize a raw label into a filesystem-safe directory name.
///
/// Keeps alphanumerics plus space, dash, underscore and dot; drops path
/// separators and control characters; collapses whitespace; trims dots and
/// spaces at the edges; caps the length at a char boundary. Returns None when
/// nothing usable remains.
fn sanitize(raw: &str) -> Option<String> {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect();

    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        return None;
    }

    let capped: String = trimmed.chars().take(MAX_CATEGORY_LEN).collect();
    let capped = capped.trim_end_matches(|c| c == '.' || c == ' ').to_string();
    if capped.is_empty() {
        None
    } else {
        Some(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassificationResult, RankedLabel};

    fn result(labels: &[(&str, f32)]) -> ClassificationResult {
        ClassificationResult::new(
            labels
                .iter()
                .map(|(c, s)| RankedLabel {
                    category: c.to_string(),
                    confidence: *s,
                })
                .collect(),
            "test",
        )
    }

    #[test]
    fn test_confident_label_wins() {
        let category = resolve(&result(&[("invoices", 0.92)]), 0.5, &[], "uncategorized");
        assert_eq!(category.as_str(), "invoices");
    }

    #[test]
    fn test_low_confidence_falls_back() {
        let category = resolve(&result(&[("spam", 0.3)]), 0.5, &[], "uncategorized");
        assert_eq!(category.as_str(), "uncategorized");
    }

    #[test]
    fn test_empty_labels_fall_back() {
        let category = resolve(&ClassificationResult::empty("test"), 0.5, &[], "other");
        assert_eq!(category.as_str(), "other");
    }

    #[test]
    fn test_allow_list_falls_through_to_next_label() {
        let allowed = vec!["reports".to_string()];
        let category = resolve(
            &result(&[("invoices", 0.9), ("reports", 0.8)]),
            0.5,
            &allowed,
            "uncategorized",
        );
        assert_eq!(category.as_str(), "reports");
    }

    #[test]
    fn test_allow_list_with_no_match_falls_back() {
        let allowed = vec!["reports".to_string()];
        let category = resolve(&result(&[("invoices", 0.9)]), 0.5, &allowed, "uncategorized");
        assert_eq!(category.as_str(), "uncategorized");
    }

    #[test]
    fn test_threshold_checked_before_allow_list() {
        // A label on the allow-list but below threshold never qualifies.
        let allowed = vec!["reports".to_string()];
        let category = resolve(&result(&[("reports", 0.2)]), 0.5, &allowed, "uncategorized");
        assert_eq!(category.as_str(), "uncategorized");
    }

    #[test]
    fn test_sanitize_strips_separators_and_controls() {
        let category = resolve(
            &result(&[("../etc/passwd\u{0007}", 0.9)]),
            0.5,
            &[],
            "uncategorized",
        );
        assert!(!category.as_str().contains('/'));
        assert!(!category.as_str().contains(".."));
        assert_eq!(category.as_str(), "etcpasswd");
    }

    #[test]
    fn test_malformed_label_degrades_to_fallback() {
        let category = resolve(&result(&[("///", 0.9)]), 0.5, &[], "uncategorized");
        assert_eq!(category.as_str(), "uncategorized");
    }

    #[test]
    fn test_malformed_fallback_degrades_to_default() {
        let category = resolve(&ClassificationResult::empty("test"), 0.5, &[], "..");
        assert_eq!(category.as_str(), "uncategorized");
    }

    #[test]
    fn test_length_cap() {
        let long = "a".repeat(300);
        let category = resolve(&result(&[(long.as_str(), 0.9)]), 0.5, &[], "uncategorized");
        assert_eq!(category.as_str().len(), MAX_CATEGORY_LEN);
    }

    #[test]
    fn test_whitespace_collapsed() {
        let category = resolve(
            &result(&[("tax   \t returns", 0.9)]),
            0.5,
            &[],
            "uncategorized",
        );
        assert_eq!(category.as_str(), "tax returns");
    }

    #[test]
    fn test_deterministic() {
        let classification = result(&[("invoices", 0.9), ("reports", 0.9)]);
        let first = resolve(&classification, 0.5, &[], "uncategorized");
        let second = resolve(&classification, 0.5, &[], "uncategorized");
        assert_eq!(first, second);
    }
}
