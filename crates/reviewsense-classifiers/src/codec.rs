//! Label <-> class index mapping

use reviewsense_core::{Error, Result, Sentiment};
use serde::{Deserialize, Serialize};

/// Bijective mapping between sentiment labels and class indices.
///
/// Classes are the distinct fitted labels sorted by label string, so index
/// assignment depends only on which labels were present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    classes: Vec<Sentiment>,
}

impl LabelCodec {
    /// Fit on a label sequence
    pub fn fit(labels: &[Sentiment]) -> Result<Self> {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            return Err(Error::training("cannot fit label codec on no labels"));
        }

        Ok(Self { classes })
    }

    /// Build directly from an ordered class list
    pub fn from_classes(classes: Vec<Sentiment>) -> Result<Self> {
        let mut sorted = classes.clone();
        sorted.sort();
        sorted.dedup();
        if classes.is_empty() || sorted != classes {
            return Err(Error::corrupt_artifact(format!(
                "label classes {:?} are not distinct and sorted",
                classes
            )));
        }
        Ok(Self { classes })
    }

    /// Fitted classes in index order
    pub fn classes(&self) -> &[Sentiment] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: Sentiment) -> Result<usize> {
        self.classes
            .binary_search(&label)
            .map_err(|_| Error::unseen_label(label.as_str()))
    }

    /// Encode a label given as a string
    pub fn encode_str(&self, label: &str) -> Result<usize> {
        self.encode(label.parse()?)
    }

    /// Encode a whole label sequence; the first unseen label aborts
    pub fn encode_all(&self, labels: &[Sentiment]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(*l)).collect()
    }

    pub fn decode(&self, index: usize) -> Result<Sentiment> {
        self.classes.get(index).copied().ok_or_else(|| {
            Error::internal(format!(
                "class index {} out of range for {} classes",
                index,
                self.classes.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_label_order() {
        let codec = LabelCodec::fit(&[
            Sentiment::Positive,
            Sentiment::Negative,
            Sentiment::Neutral,
            Sentiment::Positive,
        ])
        .unwrap();

        assert_eq!(codec.encode(Sentiment::Negative).unwrap(), 0);
        assert_eq!(codec.encode(Sentiment::Neutral).unwrap(), 1);
        assert_eq!(codec.encode(Sentiment::Positive).unwrap(), 2);
    }

    #[test]
    fn test_round_trip_for_every_fitted_label() {
        let labels = [Sentiment::Positive, Sentiment::Negative];
        let codec = LabelCodec::fit(&labels).unwrap();

        for label in labels {
            assert_eq!(codec.decode(codec.encode(label).unwrap()).unwrap(), label);
        }
    }

    #[test]
    fn test_unseen_label_fails() {
        let codec = LabelCodec::fit(&[Sentiment::Positive, Sentiment::Negative]).unwrap();

        assert!(matches!(
            codec.encode(Sentiment::Neutral),
            Err(Error::UnseenLabel(_))
        ));
        assert!(matches!(codec.encode_str("Mixed"), Err(Error::UnseenLabel(_))));
    }

    #[test]
    fn test_decode_out_of_range_fails() {
        let codec = LabelCodec::fit(&[Sentiment::Neutral]).unwrap();
        assert!(codec.decode(1).is_err());
    }

    #[test]
    fn test_from_classes_rejects_unsorted() {
        assert!(LabelCodec::from_classes(vec![Sentiment::Positive, Sentiment::Negative]).is_err());
        assert!(LabelCodec::from_classes(Vec::new()).is_err());
    }
}
