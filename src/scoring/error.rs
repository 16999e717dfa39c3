use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding dimension mismatch: image has {image}, concept bank has {concept}")]
    DimensionMismatch { image: usize, concept: usize },

    #[error("concept bank is empty")]
    EmptyConceptBank,

    #[error("invalid threshold {value}: must be finite")]
    InvalidThreshold { value: f32 },
}
