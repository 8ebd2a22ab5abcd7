//! Training configuration

use crate::logistic::LogisticConfig;
use crate::vectorizer::TfidfConfig;
use reviewsense_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Feature extraction settings
    #[serde(default)]
    pub vectorizer: TfidfConfig,

    /// Classifier settings
    #[serde(default)]
    pub classifier: LogisticConfig,

    /// Split and cross-validation settings
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Append the fixed neutral examples to the corpus
    #[serde(default = "default_true")]
    pub include_neutral_examples: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vectorizer: TfidfConfig::default(),
            classifier: LogisticConfig::default(),
            evaluation: EvaluationConfig::default(),
            include_neutral_examples: true,
        }
    }
}

/// Held-out split and cross-validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Fraction of each class held out for the final report
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed of the split shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of cross-validation folds
    #[serde(default = "default_folds")]
    pub folds: usize,

    /// Train folds on separate threads
    #[serde(default = "default_true")]
    pub parallel_folds: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            folds: default_folds(),
            parallel_folds: true,
        }
    }
}

impl TrainingConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse training config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.classifier.validate()?;

        let eval = &self.evaluation;
        if !(eval.test_size > 0.0 && eval.test_size < 1.0) {
            return Err(Error::config(format!(
                "test_size must be in (0, 1), got {}",
                eval.test_size
            )));
        }
        if eval.folds < 2 {
            return Err(Error::config(format!(
                "folds must be at least 2, got {}",
                eval.folds
            )));
        }
        Ok(())
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_folds() -> usize {
    5
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.vectorizer.max_features, 5000);
        assert_eq!(config.vectorizer.ngram_range, (1, 3));
        assert_eq!(config.classifier.max_iter, 1000);
        assert_eq!(config.evaluation.folds, 5);
        assert_eq!(config.evaluation.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
vectorizer:
  max_features: 200
  ngram_range: [1, 2]
evaluation:
  folds: 3
"#;
        let config = TrainingConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.vectorizer.max_features, 200);
        assert_eq!(config.vectorizer.ngram_range, (1, 2));
        assert_eq!(config.evaluation.folds, 3);
        assert_eq!(config.evaluation.test_size, 0.2);
        assert!(config.include_neutral_examples);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TrainingConfig::from_yaml("evaluation:\n  folds: 1\n").is_err());
        assert!(TrainingConfig::from_yaml("evaluation:\n  test_size: 1.5\n").is_err());
        assert!(TrainingConfig::from_yaml("vectorizer:\n  ngram_range: [3, 1]\n").is_err());
        assert!(TrainingConfig::from_yaml("classifier:\n  c: -1.0\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.yaml");
        std::fs::write(&path, "include_neutral_examples: false\n").unwrap();

        let config = TrainingConfig::from_file(&path).unwrap();
        assert!(!config.include_neutral_examples);
    }
}
