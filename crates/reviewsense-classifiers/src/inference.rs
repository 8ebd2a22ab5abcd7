//! Serving-side sentiment predictor over a loaded artifact set

use crate::artifacts::ArtifactSet;
use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::vectorizer::SparseVector;
use reviewsense_core::{Result, Sentiment};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Predicts sentiment for arbitrary text.
///
/// Holds the artifact set behind an `Arc`; the set is read-only after
/// construction, so the engine is cheap to clone and safe to call from
/// any number of tasks.
#[derive(Debug, Clone)]
pub struct SentimentEngine {
    name: String,
    artifacts: Arc<ArtifactSet>,
}

impl SentimentEngine {
    pub fn new(artifacts: ArtifactSet) -> Self {
        Self {
            name: "tfidf-logistic".to_string(),
            artifacts: Arc::new(artifacts),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Load the artifact set stored in `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ArtifactSet::load(dir)?))
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Predict one label.
    ///
    /// Text with no known terms (including empty text) still yields a label:
    /// the intercept-only decision.
    pub fn predict_sentiment(&self, text: &str) -> Sentiment {
        self.artifacts.predict(text)
    }

    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Sentiment> {
        texts
            .iter()
            .map(|t| self.predict_sentiment(t.as_ref()))
            .collect()
    }

    /// Normalized one-vs-rest scores per class, in codec order
    pub fn scores(&self, text: &str) -> Vec<(Sentiment, f64)> {
        self.scores_for(&self.artifacts.vectorizer().transform(text))
    }

    fn scores_for(&self, x: &SparseVector) -> Vec<(Sentiment, f64)> {
        let proba = self.artifacts.classifier().predict_proba(x);
        self.artifacts
            .codec()
            .classes()
            .iter()
            .copied()
            .zip(proba)
            .collect()
    }
}

#[async_trait::async_trait]
impl Classifier for SentimentEngine {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();

        let x = self.artifacts.vectorizer().transform(text);
        let label = self.artifacts.decode_prediction(&x);
        let all_scores = self.scores_for(&x);
        let score = all_scores
            .iter()
            .find(|(s, _)| *s == label)
            .map(|(_, p)| *p)
            .unwrap_or(0.0);

        let mut result = ClassificationResult::new(label, score);
        result.metadata = ClassificationMetadata {
            model: Some(self.name.clone()),
            all_scores: Some(all_scores),
            known_terms: x.nnz(),
        };
        result.latency_us = start.elapsed().as_micros() as u64;
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LabelCodec;
    use crate::logistic::LogisticTrainer;
    use crate::vectorizer::{TfidfConfig, TfidfVectorizer};

    fn engine() -> SentimentEngine {
        let docs = [
            "great app love it",
            "excellent and great",
            "terrible app hate it",
            "awful and terrible",
            "it opens the menu",
            "the menu has buttons",
        ];
        let labels = [
            Sentiment::Positive,
            Sentiment::Positive,
            Sentiment::Negative,
            Sentiment::Negative,
            Sentiment::Neutral,
            Sentiment::Neutral,
        ];

        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::default());
        let x = vectorizer.fit_transform(&docs).unwrap();
        let codec = LabelCodec::fit(&labels).unwrap();
        let y = codec.encode_all(&labels).unwrap();
        let model = LogisticTrainer::default()
            .fit(&x, &y, codec.n_classes())
            .unwrap()
            .model;
        SentimentEngine::new(ArtifactSet::new(vectorizer, model, codec).unwrap())
    }

    #[test]
    fn test_predicts_training_sentiment() {
        let engine = engine();
        assert_eq!(engine.predict_sentiment("great app"), Sentiment::Positive);
        assert_eq!(engine.predict_sentiment("terrible app"), Sentiment::Negative);
    }

    #[test]
    fn test_empty_and_unknown_text_yield_a_label() {
        let engine = engine();
        let empty = engine.predict_sentiment("");
        assert_eq!(engine.predict_sentiment("   "), empty);
        assert_eq!(engine.predict_sentiment("zzz qqq"), empty);
        assert!(Sentiment::ALL.contains(&empty));
    }

    #[test]
    fn test_deterministic() {
        let engine = engine();
        let text = "love the menu but it is terrible";
        let first = engine.predict_sentiment(text);
        for _ in 0..10 {
            assert_eq!(engine.predict_sentiment(text), first);
        }
        assert_eq!(engine.scores(text), engine.scores(text));
    }

    #[test]
    fn test_batch_matches_single() {
        let engine = engine();
        let texts = ["great", "awful", "buttons"];
        let batch = engine.predict_batch(&texts);
        for (text, label) in texts.iter().zip(batch) {
            assert_eq!(engine.predict_sentiment(text), label);
        }
    }

    #[test]
    fn test_scores_sum_to_one() {
        let engine = engine();
        let scores = engine.scores("great menu");
        assert_eq!(scores.len(), 3);
        let total: f64 = scores.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_classifier_trait() {
        let engine = engine().with_name("test-model");
        let result = engine.classify("excellent app").await.unwrap();

        assert_eq!(result.label, Sentiment::Positive);
        assert_eq!(engine.name(), "test-model");
        assert_eq!(result.metadata.model.as_deref(), Some("test-model"));
        assert!(result.metadata.known_terms > 0);
        assert!(result.score > 0.0 && result.score <= 1.0);
    }

    #[tokio::test]
    async fn test_classify_scores_match_text_scores() {
        let engine = engine();
        for text in ["great menu", "hate it", "", "zzz"] {
            let result = engine.classify(text).await.unwrap();
            let scores = engine.scores(text);

            assert_eq!(result.label, engine.predict_sentiment(text));
            assert_eq!(result.metadata.all_scores.as_ref(), Some(&scores));
            let expected = scores.iter().find(|(s, _)| *s == result.label).unwrap().1;
            assert_eq!(result.score, expected);
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_agree() {
        let engine = engine();
        let expected = engine.predict_sentiment("hate it");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.classify("hate it").await.unwrap().label })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), expected);
        }
    }
}
