//! Training corpus loading and assembly
//!
//! Reviews are read from a delimited file with `content` and `score`
//! columns, labeled through [`derive_sentiment`], and then topped up with a
//! fixed set of factual sentences labeled neutral. Rating-derived neutral
//! examples are scarce and read as mixed sentiment; the fixed set gives the
//! classifier a separate cluster for plain descriptive text.

use crate::labels::derive_sentiment;
use reviewsense_core::{Error, LabeledExample, Result, Review, Sentiment};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Hand-authored factual sentences appended to every corpus as neutral
pub const NEUTRAL_EXAMPLES: [&str; 10] = [
    "The software update takes about 5 minutes to complete.",
    "The product arrived on the scheduled date.",
    "The package contains 500 grams of the item.",
    "The app has several different features.",
    "The instruction manual comes in three languages.",
    "The warranty is valid for one year from the date of purchase.",
    "The device requires two AA batteries to operate.",
    "The product is available in three different sizes.",
    "The company has been in the market for 10 years.",
    "The order can be canceled within 24 hours after purchase.",
];

/// One row of the review corpus, as read
///
/// Every column is optional at this level; required fields are enforced
/// when the row is converted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub thumbs_up_count: Option<String>,
    #[serde(default)]
    pub review_created_version: Option<String>,
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
}

impl ReviewRecord {
    fn content(&self) -> Result<&str> {
        match self.content.as_deref() {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(Error::missing_field("content")),
        }
    }

    fn score(&self) -> Result<i64> {
        let raw = self
            .score
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::missing_field("score"))?;

        raw.parse::<i64>()
            .map_err(|_| Error::invalid_field("score", raw))
    }

    /// Convert into a labeled training example
    pub fn to_example(&self) -> Result<LabeledExample> {
        let text = self.content()?;
        let score = self.score()?;
        Ok(LabeledExample::new(text, derive_sentiment(score)))
    }

    /// Convert into a stored review; the identifier is required here
    pub fn to_review(&self) -> Result<Review> {
        let review_id = self
            .review_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field("reviewId"))?;
        let content = self.content()?;
        let score = self.score()?;

        let thumbs_up_count = match self.thumbs_up_count.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| Error::invalid_field("thumbsUpCount", raw))?,
        };

        Ok(Review {
            review_id: review_id.to_string(),
            content: content.to_string(),
            score,
            user_name: non_empty(&self.user_name),
            thumbs_up_count,
            review_created_version: non_empty(&self.review_created_version),
            at: non_empty(&self.at),
            app_version: non_empty(&self.app_version),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Outcome of reading a delimited corpus
#[derive(Debug, Clone)]
pub struct CorpusLoad<T> {
    /// Converted rows
    pub items: Vec<T>,

    /// Rows read from the source
    pub rows_read: usize,

    /// Rows dropped because a required field was missing or unparsable
    pub rows_skipped: usize,
}

/// Read every row of a delimited corpus and convert it with `convert`.
///
/// Record-level errors skip the row; anything else aborts the read.
pub fn read_records<R, T, F>(reader: R, mut convert: F) -> Result<CorpusLoad<T>>
where
    R: Read,
    F: FnMut(&ReviewRecord) -> Result<T>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut items = Vec::new();
    let mut rows_read = 0;
    let mut rows_skipped = 0;

    for (row, record) in csv_reader.deserialize::<ReviewRecord>().enumerate() {
        let record = record?;
        rows_read += 1;

        match convert(&record) {
            Ok(item) => items.push(item),
            Err(e) if e.is_record_level() => {
                debug!("Skipping row {}: {}", row + 1, e);
                rows_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if rows_skipped > 0 {
        warn!("Skipped {}/{} corpus rows", rows_skipped, rows_read);
    }

    Ok(CorpusLoad {
        items,
        rows_read,
        rows_skipped,
    })
}

/// Load labeled examples from a corpus file
pub fn load_labeled_examples(path: impl AsRef<Path>) -> Result<CorpusLoad<LabeledExample>> {
    let path = path.as_ref();
    info!("Loading training corpus from {}", path.display());

    let file = std::fs::File::open(path)?;
    let load = read_records(file, ReviewRecord::to_example)?;

    info!(
        "Loaded {} labeled examples from {} rows",
        load.items.len(),
        load.rows_read
    );
    Ok(load)
}

/// Load full review records from a corpus file
pub fn load_reviews(path: impl AsRef<Path>) -> Result<CorpusLoad<Review>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_records(file, ReviewRecord::to_review)
}

/// Fixed neutral examples, in declaration order
pub fn neutral_examples() -> Vec<LabeledExample> {
    NEUTRAL_EXAMPLES
        .iter()
        .map(|text| LabeledExample::new(*text, Sentiment::Neutral))
        .collect()
}

/// Append the fixed neutral examples to rating-derived examples
pub fn assemble_corpus(mut derived: Vec<LabeledExample>) -> Vec<LabeledExample> {
    derived.extend(neutral_examples());
    derived
}

/// Count examples per label, in label order
pub fn class_counts(examples: &[LabeledExample]) -> Vec<(Sentiment, usize)> {
    Sentiment::ALL
        .iter()
        .map(|label| {
            let count = examples.iter().filter(|e| e.label == *label).count();
            (*label, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
reviewId,userName,content,score,thumbsUpCount,reviewCreatedVersion,at,appVersion
a1,ana,Love it,5,3,1.0,2024-01-01 10:00:00,1.0
a2,bo,,1,0,1.0,2024-01-02 10:00:00,1.0
a3,cy,It is fine,3,0,,2024-01-03 10:00:00,
a4,di,Broken on arrival,1,7,1.1,2024-01-04 10:00:00,1.1
a5,ed,Weird score,five,0,1.1,2024-01-05 10:00:00,1.1
";

    #[test]
    fn test_missing_content_is_skipped() {
        let load = read_records(CSV.as_bytes(), ReviewRecord::to_example).unwrap();

        assert_eq!(load.rows_read, 5);
        assert_eq!(load.rows_skipped, 2);
        assert_eq!(
            load.items,
            vec![
                LabeledExample::new("Love it", Sentiment::Positive),
                LabeledExample::new("It is fine", Sentiment::Neutral),
                LabeledExample::new("Broken on arrival", Sentiment::Negative),
            ]
        );
    }

    #[test]
    fn test_reviews_keep_provenance() {
        let load = read_records(CSV.as_bytes(), ReviewRecord::to_review).unwrap();
        let first = &load.items[0];

        assert_eq!(first.review_id, "a1");
        assert_eq!(first.user_name.as_deref(), Some("ana"));
        assert_eq!(first.thumbs_up_count, 3);
        assert_eq!(load.items[1].app_version, None);
    }

    #[test]
    fn test_only_content_and_score_required_for_training() {
        let csv = "content,score\nGood value,4\n";
        let load = read_records(csv.as_bytes(), ReviewRecord::to_example).unwrap();
        assert_eq!(load.items.len(), 1);
        assert_eq!(load.items[0].label, Sentiment::Positive);
    }

    #[test]
    fn test_assembled_corpus_appends_neutral_examples() {
        let derived = vec![LabeledExample::new("Great", Sentiment::Positive)];
        let corpus = assemble_corpus(derived);

        assert_eq!(corpus.len(), 1 + NEUTRAL_EXAMPLES.len());
        assert_eq!(corpus[0].text, "Great");
        assert!(corpus[1..].iter().all(|e| e.label == Sentiment::Neutral));
        assert_eq!(corpus[1].text, NEUTRAL_EXAMPLES[0]);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        assert_eq!(assemble_corpus(Vec::new()), assemble_corpus(Vec::new()));
    }

    #[test]
    fn test_class_counts() {
        let corpus = assemble_corpus(vec![
            LabeledExample::new("a", Sentiment::Positive),
            LabeledExample::new("b", Sentiment::Positive),
        ]);
        assert_eq!(
            class_counts(&corpus),
            vec![(Sentiment::Neutral, 10), (Sentiment::Positive, 2)]
        );
    }
}
