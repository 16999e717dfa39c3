//! The concept bank: target prompts and their cached embeddings.
//!
//! The prompt list is fixed at startup and the embedding matrix is computed
//! exactly once, then shared read-only across every request.

use tracing::info;

use crate::embedding::{ClipEncoder, EmbeddingError};

/// Default target concepts: tobacco-related scenes.
pub const DEFAULT_CONCEPT_PROMPTS: &[&str] = &[
    "tobacco leaves",
    "tobacco plant",
    "dried tobacco",
    "tobacco field",
    "tobacco harvest",
    "tobacco drying",
    "tobacco bales",
];

/// Immutable ordered concept prompts plus their unit-normalized embeddings.
#[derive(Debug, Clone)]
pub struct ConceptBank {
    prompts: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl ConceptBank {
    /// Embeds `prompts` once and caches the matrix.
    ///
    /// Fails with [`EmbeddingError::InvalidConfig`] on an empty prompt list —
    /// a gate with nothing to match against is a misconfiguration, not an
    /// always-negative classifier.
    pub fn build(encoder: &ClipEncoder, prompts: Vec<String>) -> Result<Self, EmbeddingError> {
        if prompts.is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "concept prompt list is empty".to_string(),
            });
        }

        let embeddings = encoder.embed_texts(&prompts)?;

        info!(
            concepts = prompts.len(),
            dim = embeddings.first().map(|e| e.len()).unwrap_or(0),
            "Concept bank built"
        );

        Ok(Self {
            prompts,
            embeddings,
        })
    }

    /// Builds a bank from precomputed embeddings. Intended for tests that need
    /// exact similarity values without an encoder.
    pub fn from_embeddings(prompts: Vec<String>, embeddings: Vec<Vec<f32>>) -> Self {
        debug_assert_eq!(prompts.len(), embeddings.len());
        Self {
            prompts,
            embeddings,
        }
    }

    /// Returns the default prompt list as owned strings.
    pub fn default_prompts() -> Vec<String> {
        DEFAULT_CONCEPT_PROMPTS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
