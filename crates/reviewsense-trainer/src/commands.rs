//! Train and predict commands

use anyhow::Context;
use reviewsense_classifiers::{
    load_labeled_examples, ClassificationReport, CrossValidationSummary, SentimentEngine,
    TrainingConfig, TrainingPipeline,
};
use reviewsense_core::Sentiment;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Sentences classified after every training run as a smoke check
pub const PROBE_SENTENCES: [&str; 7] = [
    "The software update takes about 5 minutes to complete.",
    "This product is amazing!",
    "I'm very disappointed with this purchase.",
    "The item arrived on time and works as expected.",
    "The package contains 500 grams of the item.",
    "The app crashed multiple times during use.",
    "The product exceeded my expectations in every way.",
];

/// One classified text
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub text: String,
    pub sentiment: Sentiment,
}

/// What `train` reports once the artifacts are written
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub corpus_size: usize,
    pub class_counts: Vec<(Sentiment, usize)>,
    pub train_size: usize,
    pub test_size: usize,
    pub cross_validation: CrossValidationSummary,
    pub report: ClassificationReport,
    pub warnings: Vec<String>,
    pub probes: Vec<Prediction>,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Corpus: {} examples ({} rows read, {} skipped)",
            self.corpus_size, self.rows_read, self.rows_skipped
        )?;
        for (label, count) in &self.class_counts {
            writeln!(f, "  {:<10}{}", label.as_str(), count)?;
        }
        writeln!(
            f,
            "Split: {} training / {} test",
            self.train_size, self.test_size
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.cross_validation)?;
        writeln!(f)?;
        writeln!(f, "Classification Report:")?;
        writeln!(f, "{}", self.report)?;

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  {}", warning)?;
            }
        }

        for probe in &self.probes {
            writeln!(f)?;
            writeln!(f, "Sentence: '{}'", probe.text)?;
            writeln!(f, "Predicted sentiment: {}", probe.sentiment)?;
        }
        Ok(())
    }
}

/// Train on `data` and write the artifact set into `artifacts`
pub fn train(
    data: &Path,
    artifacts: &Path,
    config: Option<&Path>,
) -> anyhow::Result<TrainingSummary> {
    let config = match config {
        Some(path) => TrainingConfig::from_file(path)
            .with_context(|| format!("Failed to load training config {}", path.display()))?,
        None => TrainingConfig::default(),
    };

    let load = load_labeled_examples(data)
        .with_context(|| format!("Failed to read corpus {}", data.display()))?;
    let (rows_read, rows_skipped) = (load.rows_read, load.rows_skipped);

    let outcome = TrainingPipeline::new(config).run(load.items)?;
    outcome
        .artifacts
        .save(artifacts)
        .with_context(|| format!("Failed to write artifacts to {}", artifacts.display()))?;

    let engine = SentimentEngine::new(outcome.artifacts);
    let probes = classify(&engine, PROBE_SENTENCES.iter().map(|s| s.to_string()));

    Ok(TrainingSummary {
        rows_read,
        rows_skipped,
        corpus_size: outcome.corpus_size,
        class_counts: outcome.class_counts,
        train_size: outcome.train_size,
        test_size: outcome.test_size,
        cross_validation: outcome.cross_validation,
        report: outcome.report,
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        probes,
    })
}

/// Classify `texts` with the artifact set in `artifacts`
pub fn predict(artifacts: &Path, texts: Vec<String>) -> anyhow::Result<Vec<Prediction>> {
    let engine = SentimentEngine::from_dir(artifacts)
        .with_context(|| format!("Failed to load artifacts from {}", artifacts.display()))?;

    let texts = if texts.is_empty() {
        PROBE_SENTENCES.iter().map(|s| s.to_string()).collect()
    } else {
        texts
    };
    Ok(classify(&engine, texts))
}

fn classify(engine: &SentimentEngine, texts: impl IntoIterator<Item = String>) -> Vec<Prediction> {
    texts
        .into_iter()
        .map(|text| {
            let sentiment = engine.predict_sentiment(&text);
            info!("{:?} -> {}", text, sentiment);
            Prediction { text, sentiment }
        })
        .collect()
}
