use std::path::PathBuf;
use std::sync::Arc;

use crate::clearance::ClearanceClient;
use crate::concepts::ConceptBank;
use crate::embedding::ClipEncoder;
use crate::scoring::SimilarityScorer;

/// Shared per-request state: everything here is built once at startup and
/// cloned cheaply into each handler invocation.
#[derive(Clone)]
pub struct HandlerState {
    pub encoder: Arc<ClipEncoder>,

    pub concepts: Arc<ConceptBank>,

    pub scorer: Arc<SimilarityScorer>,

    pub clearance: Arc<ClearanceClient>,

    /// Pre-shared inbound bearer token. `None` leaves the endpoint open
    /// (credential-exchange deployments).
    pub expected_token: Option<String>,

    /// Directory where uploads are staged for the duration of a request.
    pub spool_path: PathBuf,
}

impl HandlerState {
    pub fn new(
        encoder: Arc<ClipEncoder>,
        concepts: Arc<ConceptBank>,
        scorer: Arc<SimilarityScorer>,
        clearance: Arc<ClearanceClient>,
        expected_token: Option<String>,
        spool_path: PathBuf,
    ) -> Self {
        Self {
            encoder,
            concepts,
            scorer,
            clearance,
            expected_token,
            spool_path,
        }
    }
}
