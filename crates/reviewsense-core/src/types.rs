//! Core types for reviewsense

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-way sentiment label
///
/// Variants are declared in label-string order so that `Ord` matches the
/// order in which the label codec assigns class indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    /// Every label, in codec order
    pub const ALL: [Sentiment; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Label string as it appears in corpora and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Negative" => Ok(Self::Negative),
            "Neutral" => Ok(Self::Neutral),
            "Positive" => Ok(Self::Positive),
            other => Err(Error::unseen_label(other)),
        }
    }
}

/// A (text, label) pair used for training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Free text
    pub text: String,

    /// Target label
    pub label: Sentiment,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: Sentiment) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// A stored product review
///
/// Field names follow the column headers of the review corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// External identifier, unique per review
    pub review_id: String,

    /// Review text
    pub content: String,

    /// Star rating (1-5)
    pub score: i64,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub thumbs_up_count: i64,

    #[serde(default)]
    pub review_created_version: Option<String>,

    /// Timestamp as provided by the source
    #[serde(default)]
    pub at: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,
}

/// Body for creating a review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    /// Identifier; generated when absent
    #[serde(default)]
    pub review_id: Option<String>,

    pub content: String,

    pub score: i64,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub thumbs_up_count: Option<i64>,

    #[serde(default)]
    pub review_created_version: Option<String>,

    #[serde(default)]
    pub at: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,
}

impl NewReview {
    /// Validate and turn into a stored review with the given identifier
    pub fn into_review(self, review_id: String) -> Result<Review> {
        validate_score(self.score)?;
        validate_thumbs(self.thumbs_up_count)?;

        Ok(Review {
            review_id,
            content: self.content,
            score: self.score,
            user_name: self.user_name,
            thumbs_up_count: self.thumbs_up_count.unwrap_or(0),
            review_created_version: self.review_created_version,
            at: self.at,
            app_version: self.app_version,
        })
    }
}

/// Partial update of a review; only provided fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewPatch {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub score: Option<i64>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub thumbs_up_count: Option<i64>,

    #[serde(default)]
    pub review_created_version: Option<String>,

    #[serde(default)]
    pub at: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,
}

impl ReviewPatch {
    /// Check every provided field before anything is applied
    pub fn validate(&self) -> Result<()> {
        if let Some(score) = self.score {
            validate_score(score)?;
        }
        validate_thumbs(self.thumbs_up_count)
    }

    /// Apply the provided fields to `review`
    pub fn apply(self, review: &mut Review) -> Result<()> {
        self.validate()?;

        if let Some(content) = self.content {
            review.content = content;
        }
        if let Some(score) = self.score {
            review.score = score;
        }
        if let Some(user_name) = self.user_name {
            review.user_name = Some(user_name);
        }
        if let Some(count) = self.thumbs_up_count {
            review.thumbs_up_count = count;
        }
        if let Some(version) = self.review_created_version {
            review.review_created_version = Some(version);
        }
        if let Some(at) = self.at {
            review.at = Some(at);
        }
        if let Some(version) = self.app_version {
            review.app_version = Some(version);
        }

        Ok(())
    }

    /// True when no field is provided
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.score.is_none()
            && self.user_name.is_none()
            && self.thumbs_up_count.is_none()
            && self.review_created_version.is_none()
            && self.at.is_none()
            && self.app_version.is_none()
    }
}

fn validate_score(score: i64) -> Result<()> {
    if (1..=5).contains(&score) {
        Ok(())
    } else {
        Err(Error::invalid_field("score", score.to_string()))
    }
}

fn validate_thumbs(count: Option<i64>) -> Result<()> {
    match count {
        Some(c) if c < 0 => Err(Error::invalid_field("thumbsUpCount", c.to_string())),
        _ => Ok(()),
    }
}

/// Inference request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
}

/// Inference response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub sentiment: Sentiment,
}
