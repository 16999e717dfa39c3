//! Similarity scoring and verdict aggregation.
//!
//! An image embedding is compared against every concept embedding in the
//! [`ConceptBank`](crate::concepts::ConceptBank) by cosine similarity, reduced
//! to a single score (max over concepts, optionally softmax-scaled), and
//! thresholded with strict `>` semantics. Per-image verdicts are OR-reduced
//! into a [`ListingVerdict`].

pub mod error;
pub mod scorer;
pub mod types;


pub use error::ScoringError;
pub use scorer::SimilarityScorer;
pub use types::{DetectionResult, ListingVerdict, ScoringMode};
