use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::payload::ErrorResponse;

/// Request-level failures surfaced to the caller.
///
/// Validation failures are rejected before any upload touches disk; staging
/// and processing failures abort the whole batch (a partial verdict could
/// wave a listing through on the images that happened to decode).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No images uploaded")]
    MissingImages,

    #[error("No listing ID provided")]
    MissingListingId,

    #[error("malformed multipart body: {0}")]
    MalformedMultipart(String),

    #[error("Unauthenticated")]
    Unauthorized,

    #[error("failed to stage upload: {0}")]
    StagingFailed(String),

    #[error("detection failed: {0}")]
    ProcessingFailed(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::MissingImages
            | GatewayError::MissingListingId
            | GatewayError::MalformedMultipart(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::StagingFailed(_) | GatewayError::ProcessingFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            status: "error",
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
