//! CLIP dual encoder (safetensors + tokenizer).
//!
//! Use [`EncoderConfig::stub`] for tests/examples without model files.

pub mod config;


pub use config::EncoderConfig;

use std::path::Path;
use std::sync::Arc;

use candle_core::{D, DType, Device, IndexOp, Tensor};
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;

/// CLIP end-of-text token, also used for padding.
const PAD_TOKEN: &str = "<|endoftext|>";

enum EncoderBackend {
    Model {
        model: Arc<Mutex<ClipModel>>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
        pad_id: u32,
    },
    Stub,
}

/// Image/text embedding encoder (supports stub mode).
///
/// Weights are loaded once at startup and never mutated afterwards; the model
/// is held behind a mutex so inference from concurrently handled requests is
/// serialized.
pub struct ClipEncoder {
    backend: EncoderBackend,
    config: EncoderConfig,
}

impl std::fmt::Debug for ClipEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEncoder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EncoderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("image_size", &self.config.image_size)
            .finish()
    }
}

impl ClipEncoder {
    /// Loads the encoder from a config (stub mode is supported).
    pub fn load(config: EncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("CLIP encoder running in STUB mode (testing only)");
            return Ok(Self {
                backend: EncoderBackend::Stub,
                config,
            });
        }

        if !config.model_available() || !config.tokenizer_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_path.clone(),
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for CLIP");

        let (model, tokenizer, pad_id) = Self::load_model(&config, &device)?;

        info!(
            model_path = %config.model_path.display(),
            embedding_dim = config.embedding_dim,
            image_size = config.image_size,
            "CLIP encoder loaded (ViT-B/32)"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model: Arc::new(Mutex::new(model)),
                tokenizer: Arc::new(tokenizer),
                device,
                pad_id,
            },
            config,
        })
    }

    fn load_model(
        config: &EncoderConfig,
        device: &Device,
    ) -> Result<(ClipModel, tokenizers::Tokenizer, u32), EmbeddingError> {
        let tokenizer = tokenizers::Tokenizer::from_file(&config.tokenizer_path).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {}", e),
            }
        })?;

        let pad_id = tokenizer
            .get_vocab(true)
            .get(PAD_TOKEN)
            .copied()
            .ok_or_else(|| EmbeddingError::TokenizationFailed {
                reason: format!("tokenizer vocab has no `{}` token", PAD_TOKEN),
            })?;

        let vb = unsafe {
            candle_nn::VarBuilder::from_mmaped_safetensors(
                &[config.model_path.clone()],
                DType::F32,
                device,
            )
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to mmap safetensors: {}", e),
            })?
        };

        let clip_config = ClipConfig::vit_base_patch32();
        let model =
            ClipModel::new(vb, &clip_config).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to build CLIP model: {}", e),
            })?;

        Ok((model, tokenizer, pad_id))
    }

    /// Embeds one decoded-on-demand image file into a unit vector.
    ///
    /// The staged file is only read for the duration of the call; no reference
    /// to it is retained.
    pub fn embed_image(&self, path: &Path) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EncoderBackend::Model { model, device, .. } => {
                let pixels = Self::image_tensor(path, self.config.image_size, device)?;
                let batch = pixels.unsqueeze(0)?;

                let features = model.lock().get_image_features(&batch)?;
                let features = l2_normalize(&features)?;
                let embedding = features.i(0)?.to_vec1::<f32>()?;

                debug!(path = %path.display(), dim = embedding.len(), "Embedded image");
                Ok(embedding)
            }
            EncoderBackend::Stub => self.embed_image_stub(path),
        }
    }

    /// Embeds text prompts, one unit vector per prompt in input order.
    pub fn embed_texts(&self, prompts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if prompts.is_empty() {
            return Ok(vec![]);
        }

        match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
                pad_id,
            } => {
                let input_ids = self.tokenize_batch(prompts, tokenizer, *pad_id, device)?;

                let features = model.lock().get_text_features(&input_ids)?;
                let features = l2_normalize(&features)?;
                Ok(features.to_vec2::<f32>()?)
            }
            EncoderBackend::Stub => prompts
                .iter()
                .map(|p| Ok(self.stub_embedding(p.as_bytes())))
                .collect(),
        }
    }

    /// Decodes and preprocesses an image into the CLIP input layout:
    /// resize-to-fill, RGB, NCHW-ready `(3, size, size)`, scaled to `[-1, 1]`.
    fn image_tensor(
        path: &Path,
        image_size: usize,
        device: &Device,
    ) -> Result<Tensor, EmbeddingError> {
        let decode_err = |reason: String| EmbeddingError::DecodeFailed {
            path: path.to_path_buf(),
            reason,
        };

        // Sniff the format from content; staged files carry opaque names.
        let img = image::ImageReader::open(path)
            .map_err(|e| decode_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;

        let size = image_size as u32;
        let img = img
            .resize_to_fill(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8()
            .into_raw();

        let pixels = Tensor::from_vec(img, (image_size, image_size, 3), device)?
            .permute((2, 0, 1))?
            .to_dtype(DType::F32)?
            .affine(2. / 255., -1.)?;

        Ok(pixels)
    }

    fn tokenize_batch(
        &self,
        prompts: &[String],
        tokenizer: &tokenizers::Tokenizer,
        pad_id: u32,
        device: &Device,
    ) -> Result<Tensor, EmbeddingError> {
        let mut rows: Vec<Vec<u32>> = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let encoding = tokenizer.encode(prompt.as_str(), true).map_err(|e| {
                EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                }
            })?;
            let mut ids = encoding.get_ids().to_vec();
            if ids.len() > self.config.context_length {
                ids.truncate(self.config.context_length);
            }
            rows.push(ids);
        }

        let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(max_len, pad_id);
        }

        Ok(Tensor::new(rows, device)?)
    }

    /// Stub image path: the file is still decoded so malformed inputs fail the
    /// same way they do with a real model, then the pixel bytes seed a
    /// deterministic embedding.
    fn embed_image_stub(&self, path: &Path) -> Result<Vec<f32>, EmbeddingError> {
        let decode_err = |reason: String| EmbeddingError::DecodeFailed {
            path: path.to_path_buf(),
            reason,
        };

        let img = image::ImageReader::open(path)
            .map_err(|e| decode_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;

        debug!(path = %path.display(), "Generating stub image embedding");
        Ok(self.stub_embedding(img.to_rgb8().as_raw()))
    }

    fn stub_embedding(&self, seed_bytes: &[u8]) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        seed_bytes.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut embedding = Vec::with_capacity(self.config.embedding_dim);
        for _ in 0..self.config.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        normalize(&mut embedding);
        embedding
    }

    /// Returns the configured output embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub)
    }

    /// Returns the encoder configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

/// Normalizes each row of a `(batch, dim)` tensor to unit L2 norm.
fn l2_normalize(t: &Tensor) -> candle_core::Result<Tensor> {
    t.broadcast_div(&t.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?)
}

fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in embedding {
            *x /= norm;
        }
    }
}
