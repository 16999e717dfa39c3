//! Model and scoring constants shared across modules.

/// Embedding dimension of the CLIP ViT-B/32 projection head.
pub const CLIP_EMBEDDING_DIM: usize = 512;

/// Input image side length expected by the vision tower.
pub const CLIP_IMAGE_SIZE: usize = 224;

/// Maximum token positions of the CLIP text tower.
pub const CLIP_CONTEXT_LENGTH: usize = 77;

/// Logit scale applied before softmax in the softmax-scaled preset.
///
/// Matches the learned temperature CLIP was trained with; the raw preset never
/// uses it.
pub const SOFTMAX_LOGIT_SCALE: f32 = 100.0;

/// Default decision threshold for raw cosine scores.
pub const DEFAULT_RAW_THRESHOLD: f32 = 0.25;

/// Default decision threshold for softmax-scaled scores.
pub const DEFAULT_SOFTMAX_THRESHOLD: f32 = 0.2;
