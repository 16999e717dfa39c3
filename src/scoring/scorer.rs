use tracing::debug;

use crate::concepts::ConceptBank;
use crate::constants::SOFTMAX_LOGIT_SCALE;

use super::error::ScoringError;
use super::types::{DetectionResult, ScoringMode};

/// Scores image embeddings against a concept bank and thresholds the result.
///
/// One scorer instance is built at startup and shared read-only across
/// requests; it holds the active preset and its matching threshold together so
/// the two cannot drift apart.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    mode: ScoringMode,
    threshold: f32,
}

impl SimilarityScorer {
    /// Creates a scorer with an explicit threshold.
    pub fn new(mode: ScoringMode, threshold: f32) -> Result<Self, ScoringError> {
        if !threshold.is_finite() {
            return Err(ScoringError::InvalidThreshold { value: threshold });
        }
        Ok(Self { mode, threshold })
    }

    /// Creates a scorer with the threshold paired to `mode`.
    pub fn with_default_threshold(mode: ScoringMode) -> Self {
        Self {
            mode,
            threshold: mode.default_threshold(),
        }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Computes one cosine similarity per concept for a single image embedding.
    ///
    /// Both sides are unit-normalized by the encoder, so the dot product is the
    /// cosine similarity.
    pub fn similarity_row(
        &self,
        image_embedding: &[f32],
        bank: &ConceptBank,
    ) -> Result<Vec<f32>, ScoringError> {
        if bank.is_empty() {
            return Err(ScoringError::EmptyConceptBank);
        }

        let mut row = Vec::with_capacity(bank.len());
        for concept in bank.embeddings() {
            if concept.len() != image_embedding.len() {
                return Err(ScoringError::DimensionMismatch {
                    image: image_embedding.len(),
                    concept: concept.len(),
                });
            }
            let dot: f32 = image_embedding
                .iter()
                .zip(concept.iter())
                .map(|(a, b)| a * b)
                .sum();
            row.push(dot);
        }
        Ok(row)
    }

    /// Reduces a similarity row to a single per-image score.
    ///
    /// Always the maximum over concepts — the best-matching concept decides,
    /// never an average or a vote.
    pub fn reduce(&self, row: &[f32]) -> Result<f32, ScoringError> {
        if row.is_empty() {
            return Err(ScoringError::EmptyConceptBank);
        }
        let score = match self.mode {
            ScoringMode::Raw => max_of(row),
            ScoringMode::SoftmaxScaled => {
                let scaled: Vec<f32> = row.iter().map(|s| s * SOFTMAX_LOGIT_SCALE).collect();
                max_of(&softmax(&scaled))
            }
        };
        Ok(score)
    }

    /// Strict threshold comparison: a score exactly at the threshold is a miss.
    pub fn classify(&self, score: f32) -> bool {
        score > self.threshold
    }

    /// Scores one image embedding end to end.
    pub fn score_image(
        &self,
        image_index: usize,
        image_embedding: &[f32],
        bank: &ConceptBank,
    ) -> Result<DetectionResult, ScoringError> {
        let row = self.similarity_row(image_embedding, bank)?;
        let score = self.reduce(&row)?;
        let is_match = self.classify(score);

        debug!(
            image_index,
            score,
            is_match,
            mode = %self.mode,
            threshold = self.threshold,
            "Scored image against concept bank"
        );

        Ok(DetectionResult {
            image_index,
            score,
            is_match,
        })
    }
}

fn max_of(xs: &[f32]) -> f32 {
    xs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Numerically stable softmax.
fn softmax(xs: &[f32]) -> Vec<f32> {
    let max = max_of(xs);
    let exps: Vec<f32> = xs.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
