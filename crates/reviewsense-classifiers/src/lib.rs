//! ReviewSense Classifiers
//!
//! Sentiment model for app-store reviews: rating-derived labels, TF-IDF
//! n-gram features, and a one-vs-rest logistic regression.
//!
//! Training runs offline and produces an [`ArtifactSet`] persisted to a
//! directory. Serving loads that set once and predicts through
//! [`SentimentEngine`], which is read-only and safe to share between tasks.

pub mod artifacts;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod inference;
pub mod labels;
pub mod logistic;
pub mod optimizer;
pub mod report;
pub mod training;
pub mod vectorizer;

pub use artifacts::{ArtifactSet, ArtifactStore};
pub use classifier::{ClassificationMetadata, ClassificationResult, Classifier};
pub use codec::LabelCodec;
pub use config::{EvaluationConfig, TrainingConfig};
pub use corpus::{load_labeled_examples, load_reviews, neutral_examples, CorpusLoad};
pub use inference::SentimentEngine;
pub use labels::derive_sentiment;
pub use logistic::{LogisticConfig, LogisticTrainer, OneVsRestLogistic};
pub use report::{ClassificationReport, ConfusionMatrix, CrossValidationSummary};
pub use training::{TrainingOutcome, TrainingPipeline, TrainingWarning};
pub use vectorizer::{SparseVector, TfidfConfig, TfidfVectorizer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::ArtifactSet;
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::config::TrainingConfig;
    pub use crate::inference::SentimentEngine;
    pub use crate::training::TrainingPipeline;
}
