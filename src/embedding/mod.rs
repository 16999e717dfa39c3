//! Embedding generation: CLIP dual encoder and device selection.

pub mod clip;
pub(crate) mod device;
pub mod error;

pub use clip::{ClipEncoder, EncoderConfig};
pub use error::EmbeddingError;
