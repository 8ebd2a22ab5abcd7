//! Classifier trait and common types

use async_trait::async_trait;
use reviewsense_core::{Result, Sentiment};

/// Trait for text classifiers
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of classification
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Predicted label
    pub label: Sentiment,

    /// Confidence of the predicted label (0.0-1.0)
    pub score: f64,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a result with empty metadata and zero latency
    pub fn new(label: Sentiment, score: f64) -> Self {
        Self {
            label,
            score,
            metadata: ClassificationMetadata::default(),
            latency_us: 0,
        }
    }
}

/// Metadata about classification
#[derive(Debug, Clone, Default)]
pub struct ClassificationMetadata {
    /// Model name
    pub model: Option<String>,

    /// Per-class scores, in codec order
    pub all_scores: Option<Vec<(Sentiment, f64)>>,

    /// Number of input terms found in the vocabulary
    pub known_terms: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_has_empty_metadata() {
        let result = ClassificationResult::new(Sentiment::Neutral, 0.4);
        assert_eq!(result.label, Sentiment::Neutral);
        assert_eq!(result.score, 0.4);
        assert_eq!(result.latency_us, 0);
        assert!(result.metadata.model.is_none());
        assert!(result.metadata.all_scores.is_none());
    }
}
