//! Rating to sentiment derivation

use reviewsense_core::Sentiment;

/// Rating at which a review counts as neutral
pub const NEUTRAL_RATING: i64 = 3;

/// Collapse a star rating into a three-way sentiment label.
///
/// Ratings above three are positive, below three negative. The rule is
/// total over the integers so out-of-range ratings still get a label.
pub fn derive_sentiment(rating: i64) -> Sentiment {
    match rating.cmp(&NEUTRAL_RATING) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_every_star_rating() {
        assert_eq!(derive_sentiment(1), Sentiment::Negative);
        assert_eq!(derive_sentiment(2), Sentiment::Negative);
        assert_eq!(derive_sentiment(3), Sentiment::Neutral);
        assert_eq!(derive_sentiment(4), Sentiment::Positive);
        assert_eq!(derive_sentiment(5), Sentiment::Positive);
    }

    proptest! {
        #[test]
        fn prop_rule_holds_for_any_rating(r in -1000i64..1000) {
            let label = derive_sentiment(r);
            prop_assert_eq!(label == Sentiment::Positive, r > 3);
            prop_assert_eq!(label == Sentiment::Negative, r < 3);
            prop_assert_eq!(label == Sentiment::Neutral, r == 3);
        }
    }
}
