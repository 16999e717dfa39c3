use std::str::FromStr;

use crate::constants::{DEFAULT_RAW_THRESHOLD, DEFAULT_SOFTMAX_THRESHOLD};

/// Score normalization preset.
///
/// The two presets are not numerically interchangeable: each carries its own
/// default threshold, and a threshold tuned for one preset is meaningless under
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// Max cosine similarity over concepts, thresholded directly.
    #[default]
    Raw,
    /// Max of softmax(100 × cosine similarities), a probability-like value.
    SoftmaxScaled,
}

impl ScoringMode {
    /// Returns the short configuration name for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::Raw => "raw",
            ScoringMode::SoftmaxScaled => "softmax",
        }
    }

    /// Returns the decision threshold paired with this mode.
    pub fn default_threshold(&self) -> f32 {
        match self {
            ScoringMode::Raw => DEFAULT_RAW_THRESHOLD,
            ScoringMode::SoftmaxScaled => DEFAULT_SOFTMAX_THRESHOLD,
        }
    }
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ScoringMode::Raw),
            "softmax" | "softmax-scaled" => Ok(ScoringMode::SoftmaxScaled),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-image verdict, one per uploaded image, input order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Position of the image in the uploaded batch.
    pub image_index: usize,
    /// Reduced similarity score (max over concepts under the active preset).
    pub score: f32,
    /// `score > threshold`, strict.
    pub is_match: bool,
}

/// Listing-level verdict: a pure OR reduction over the per-image results.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingVerdict {
    pub listing_id: String,
    pub is_match: bool,
    pub per_image: Vec<DetectionResult>,
}

impl ListingVerdict {
    /// Reduces per-image results to a listing verdict.
    ///
    /// Empty batches are rejected at request validation and never reach this
    /// point; an empty slice still reduces to `false` rather than panicking.
    pub fn from_results(listing_id: impl Into<String>, per_image: Vec<DetectionResult>) -> Self {
        let is_match = per_image.iter().any(|r| r.is_match);
        Self {
            listing_id: listing_id.into(),
            is_match,
            per_image,
        }
    }

    /// Returns the per-image booleans in input order (the response array).
    pub fn detection_flags(&self) -> Vec<bool> {
        self.per_image.iter().map(|r| r.is_match).collect()
    }
}
