//! Leafgate library crate (used by the server binary and integration tests).
//!
//! Leafgate is an image compliance gate for tobacco auction listings: a batch of
//! images uploaded for a listing is embedded with a CLIP dual encoder, scored
//! against a fixed bank of tobacco concept prompts, and reduced to a single
//! listing verdict. A positive verdict triggers a clearance request against the
//! external case-management API; that side effect is best-effort and never
//! alters the detection response.
//!
//! # Module map
//!
//! - [`config`] — `LEAFGATE_*` environment configuration.
//! - [`embedding`] — CLIP encoder (image + text), device selection.
//! - [`concepts`] — the immutable concept bank and its cached embeddings.
//! - [`scoring`] — similarity rows, score reduction, verdict aggregation.
//! - [`clearance`] — authenticate-then-notify client for positive verdicts.
//! - [`gateway`] — Axum router, `POST /detect` orchestration.

pub mod clearance;
pub mod concepts;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod scoring;

pub use clearance::{ClearanceClient, ClearanceConfig, ClearanceError, ClearanceOutcome};
pub use concepts::{ConceptBank, DEFAULT_CONCEPT_PROMPTS};
pub use config::{AuthMode, Config, ConfigError};
pub use embedding::{ClipEncoder, EmbeddingError, EncoderConfig};
pub use gateway::{HandlerState, create_router_with_state};
pub use scoring::{
    DetectionResult, ListingVerdict, ScoringError, ScoringMode, SimilarityScorer,
};
