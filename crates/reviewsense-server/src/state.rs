//! Shared application state

use crate::config::ServerConfig;
use crate::store::{tally, ReviewStore, SentimentStats};
use metrics_exporter_prometheus::PrometheusHandle;
use reviewsense_classifiers::{load_reviews, SentimentEngine};
use reviewsense_core::{Result, Sentiment};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Sentiment predictor over the artifact set loaded at startup
    pub engine: Arc<SentimentEngine>,

    pub reviews: Arc<ReviewStore>,

    pub stats: Arc<SentimentStats>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

/// Result of a bulk corpus load
#[derive(Debug, Clone, Copy)]
pub struct LoadSummary {
    pub rows_processed: usize,
    pub rows_skipped: usize,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: SentimentEngine, metrics_handle: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            reviews: Arc::new(ReviewStore::new()),
            stats: Arc::new(SentimentStats::new()),
            metrics_handle,
        }
    }

    /// Load the artifact set named in `config`.
    ///
    /// A missing or inconsistent artifact set is an error; the server does
    /// not start without a usable model.
    pub fn from_config(config: ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let engine = SentimentEngine::from_dir(&config.artifacts_dir)?;
        Ok(Self::new(config, engine, metrics_handle))
    }

    /// Upsert every valid row of the configured corpus
    pub fn load_dataset(&self) -> Result<LoadSummary> {
        let load = load_reviews(&self.config.dataset_path)?;
        let rows_processed = self.reviews.upsert_many(load.items);
        info!(
            "Loaded {} reviews from {} ({} skipped)",
            rows_processed,
            self.config.dataset_path.display(),
            load.rows_skipped
        );

        Ok(LoadSummary {
            rows_processed,
            rows_skipped: load.rows_skipped,
        })
    }

    /// Counters, classifying every stored review first if none exist yet
    pub fn sentiment_stats(&self) -> BTreeMap<Sentiment, u64> {
        if !self.stats.is_empty() {
            return self.stats.snapshot();
        }

        let contents = self.reviews.contents();
        let counts = tally(contents.iter().map(|c| self.engine.predict_sentiment(c)));
        info!("Initialized sentiment stats from {} reviews", contents.len());
        self.stats.initialize(counts)
    }
}
