//! ReviewSense Core
//!
//! Core types and error handling shared across ReviewSense components.
//!
//! This crate provides:
//! - The three-way `Sentiment` label
//! - Review records, typed create/patch bodies, and labeled examples
//! - Request and response bodies of the inference interface
//! - The crate-wide error type and result alias

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    LabeledExample, NewReview, Review, ReviewPatch, Sentiment, SentimentRequest,
    SentimentResponse,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{LabeledExample, Review, Sentiment};
}
