use serde::Serialize;

use crate::scoring::ListingVerdict;

/// Success body for `POST /detect`.
///
/// `detection_results` holds one boolean per uploaded image, in upload order;
/// `is_tobacco` is their OR.
#[derive(Serialize, Debug, Clone)]
pub struct DetectResponse {
    pub status: &'static str,
    pub is_tobacco: bool,
    pub detection_results: Vec<bool>,
}

impl DetectResponse {
    pub fn from_verdict(verdict: &ListingVerdict) -> Self {
        Self {
            status: "success",
            is_tobacco: verdict.is_match,
            detection_results: verdict.detection_flags(),
        }
    }
}

/// Error body shared by all failure responses.
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}
