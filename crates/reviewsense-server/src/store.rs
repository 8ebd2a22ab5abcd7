//! In-process review and sentiment-count storage

use parking_lot::RwLock;
use reviewsense_core::{Review, ReviewPatch, Sentiment};
use std::collections::{BTreeMap, HashMap};

/// Failure of a store operation keyed by review id
#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Duplicate(String),
    Invalid(reviewsense_core::Error),
}

/// Reviews keyed by `reviewId`, listed in insertion order
#[derive(Debug, Default)]
pub struct ReviewStore {
    inner: RwLock<ReviewTable>,
}

#[derive(Debug, Default)]
struct ReviewTable {
    next_seq: u64,
    rows: BTreeMap<u64, Review>,
    by_id: HashMap<String, u64>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, review_id: &str) -> Option<Review> {
        let table = self.inner.read();
        table
            .by_id
            .get(review_id)
            .and_then(|seq| table.rows.get(seq))
            .cloned()
    }

    /// Page through reviews in insertion order
    pub fn list(&self, skip: usize, limit: usize) -> Vec<Review> {
        self.inner
            .read()
            .rows
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Content of every stored review
    pub fn contents(&self) -> Vec<String> {
        self.inner
            .read()
            .rows
            .values()
            .map(|r| r.content.clone())
            .collect()
    }

    /// Insert a new review; its id must not exist yet
    pub fn insert(&self, review: Review) -> Result<Review, StoreError> {
        let mut table = self.inner.write();
        if table.by_id.contains_key(&review.review_id) {
            return Err(StoreError::Duplicate(review.review_id));
        }
        table.push(review.clone());
        Ok(review)
    }

    /// Insert or replace reviews by id; replaced reviews keep their position
    pub fn upsert_many(&self, reviews: impl IntoIterator<Item = Review>) -> usize {
        let mut table = self.inner.write();
        let mut processed = 0;
        for review in reviews {
            match table.by_id.get(&review.review_id).copied() {
                Some(seq) => {
                    table.rows.insert(seq, review);
                }
                None => table.push(review),
            }
            processed += 1;
        }
        processed
    }

    /// Apply a partial update
    pub fn update(&self, review_id: &str, patch: ReviewPatch) -> Result<Review, StoreError> {
        let mut table = self.inner.write();
        let seq = *table
            .by_id
            .get(review_id)
            .ok_or_else(|| StoreError::NotFound(review_id.to_string()))?;
        let review = table
            .rows
            .get_mut(&seq)
            .ok_or_else(|| StoreError::NotFound(review_id.to_string()))?;

        patch.apply(review).map_err(StoreError::Invalid)?;
        Ok(review.clone())
    }

    pub fn delete(&self, review_id: &str) -> Result<Review, StoreError> {
        let mut table = self.inner.write();
        let seq = table
            .by_id
            .remove(review_id)
            .ok_or_else(|| StoreError::NotFound(review_id.to_string()))?;
        table
            .rows
            .remove(&seq)
            .ok_or_else(|| StoreError::NotFound(review_id.to_string()))
    }
}

impl ReviewTable {
    fn push(&mut self, review: Review) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(review.review_id.clone(), seq);
        self.rows.insert(seq, review);
    }
}

/// Per-sentiment counters
///
/// Counters are only ever initialized once (when empty) and incremented
/// afterwards; loading more reviews does not refresh them.
#[derive(Debug, Default)]
pub struct SentimentStats {
    counts: RwLock<BTreeMap<Sentiment, u64>>,
}

impl SentimentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.read().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<Sentiment, u64> {
        self.counts.read().clone()
    }

    /// Add one to a counter, creating it at zero first; returns the new count
    pub fn increment(&self, sentiment: Sentiment) -> u64 {
        let mut counts = self.counts.write();
        let count = counts.entry(sentiment).or_insert(0);
        *count += 1;
        *count
    }

    /// Store `counts` if no counters exist yet; returns what is stored
    /// afterwards
    pub fn initialize(&self, counts: BTreeMap<Sentiment, u64>) -> BTreeMap<Sentiment, u64> {
        let mut stored = self.counts.write();
        if stored.is_empty() {
            *stored = counts;
        }
        stored.clone()
    }
}

/// Count labels, with a zero entry for every sentiment
pub fn tally(labels: impl IntoIterator<Item = Sentiment>) -> BTreeMap<Sentiment, u64> {
    let mut counts: BTreeMap<Sentiment, u64> = Sentiment::ALL.iter().map(|s| (*s, 0)).collect();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, content: &str) -> Review {
        Review {
            review_id: id.to_string(),
            content: content.to_string(),
            score: 4,
            user_name: None,
            thumbs_up_count: 0,
            review_created_version: None,
            at: None,
            app_version: None,
        }
    }

    #[test]
    fn test_upsert_keeps_position() {
        let store = ReviewStore::new();
        store.upsert_many(vec![review("a", "one"), review("b", "two")]);
        let processed = store.upsert_many(vec![review("a", "uno"), review("c", "three")]);

        assert_eq!(processed, 2);
        let ids: Vec<_> = store.list(0, 10).into_iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.get("a").unwrap().content, "uno");
    }

    #[test]
    fn test_list_pages() {
        let store = ReviewStore::new();
        store.upsert_many((0..5).map(|i| review(&i.to_string(), "x")));

        let page: Vec<_> = store.list(1, 2).into_iter().map(|r| r.review_id).collect();
        assert_eq!(page, vec!["1", "2"]);
        assert!(store.list(10, 2).is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let store = ReviewStore::new();
        store.insert(review("a", "one")).unwrap();
        assert!(matches!(
            store.insert(review("a", "again")),
            Err(StoreError::Duplicate(id)) if id == "a"
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let store = ReviewStore::new();
        store.insert(review("a", "one")).unwrap();

        let patch = ReviewPatch {
            score: Some(1),
            ..Default::default()
        };
        let updated = store.update("a", patch).unwrap();
        assert_eq!(updated.score, 1);
        assert_eq!(updated.content, "one");

        let bad = ReviewPatch {
            score: Some(9),
            ..Default::default()
        };
        assert!(matches!(store.update("a", bad), Err(StoreError::Invalid(_))));
        assert_eq!(store.get("a").unwrap().score, 1);

        store.delete("a").unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.delete("a"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_stats_initialize_once() {
        let stats = SentimentStats::new();
        let first = stats.initialize(tally([Sentiment::Positive, Sentiment::Positive]));
        assert_eq!(first[&Sentiment::Positive], 2);
        assert_eq!(first[&Sentiment::Neutral], 0);

        let second = stats.initialize(tally([Sentiment::Negative]));
        assert_eq!(second, first);

        assert_eq!(stats.increment(Sentiment::Negative), 1);
    }
}
