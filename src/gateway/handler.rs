use std::io::Write;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};

use crate::scoring::{DetectionResult, ListingVerdict};

use super::error::GatewayError;
use super::payload::DetectResponse;
use super::state::HandlerState;

/// Multipart field names accepted for image parts.
const IMAGE_FIELDS: [&str; 2] = ["images[]", "images"];
const LISTING_ID_FIELD: &str = "listing_id";

/// `POST /detect` — scores a batch of listing images and returns the verdict.
///
/// The whole multipart body is buffered and validated before anything is
/// staged to disk, so rejected requests leave no files behind. Images are then
/// embedded and scored one at a time; the first failure aborts the batch.
#[instrument(skip(state, headers, multipart), fields(listing_id = tracing::field::Empty))]
pub async fn detect_handler(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, GatewayError> {
    let inbound_token = check_inbound_token(&state, &headers)?;

    let (images, listing_id) = buffer_request(multipart).await?;

    if images.is_empty() {
        return Err(GatewayError::MissingImages);
    }
    let listing_id = listing_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(GatewayError::MissingListingId)?;
    tracing::Span::current().record("listing_id", tracing::field::display(&listing_id));

    let mut per_image = Vec::with_capacity(images.len());
    for (index, bytes) in images.into_iter().enumerate() {
        per_image.push(score_one(&state, index, bytes).await?);
    }

    let verdict = ListingVerdict::from_results(listing_id, per_image);
    info!(
        listing_id = %verdict.listing_id,
        is_tobacco = verdict.is_match,
        images = verdict.per_image.len(),
        "Listing scored"
    );

    if verdict.is_match {
        let outcome = state
            .clearance
            .trigger(&verdict.listing_id, inbound_token.as_deref())
            .await;
        debug!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            "Clearance outcome recorded"
        );
    }

    Ok((StatusCode::OK, Json(DetectResponse::from_verdict(&verdict))).into_response())
}

/// Validates the inbound bearer token when one is configured.
///
/// Returns the validated token so the clearance call can reuse it instead of
/// exchanging credentials.
fn check_inbound_token(
    state: &HandlerState,
    headers: &HeaderMap,
) -> Result<Option<String>, GatewayError> {
    let Some(expected) = &state.expected_token else {
        return Ok(None);
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(GatewayError::Unauthorized)?;

    if presented != expected {
        return Err(GatewayError::Unauthorized);
    }

    Ok(Some(presented.to_string()))
}

/// Buffers every multipart part into memory.
///
/// Nothing is written to disk here; validation has to pass first.
async fn buffer_request(
    mut multipart: Multipart,
) -> Result<(Vec<Bytes>, Option<String>), GatewayError> {
    let mut images = Vec::new();
    let mut listing_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::MalformedMultipart(e.to_string()))?
    {
        let name = field.name().map(str::to_string);

        match name.as_deref() {
            Some(n) if IMAGE_FIELDS.contains(&n) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| GatewayError::MalformedMultipart(e.to_string()))?;
                images.push(data);
            }
            Some(LISTING_ID_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| GatewayError::MalformedMultipart(e.to_string()))?;
                listing_id = Some(text);
            }
            // Unknown parts are ignored, not rejected.
            _ => {}
        }
    }

    Ok((images, listing_id))
}

/// Stages one image to the spool directory, embeds it, and scores it.
///
/// Runs on the blocking pool: decode and inference are CPU-bound. The staged
/// file is removed when the handle drops, including on the error paths.
async fn score_one(
    state: &HandlerState,
    index: usize,
    bytes: Bytes,
) -> Result<DetectionResult, GatewayError> {
    let encoder = state.encoder.clone();
    let concepts = state.concepts.clone();
    let scorer = state.scorer.clone();
    let spool_path = state.spool_path.clone();

    tokio::task::spawn_blocking(move || {
        let mut staged = tempfile::NamedTempFile::new_in(&spool_path)
            .map_err(|e| GatewayError::StagingFailed(e.to_string()))?;
        staged
            .write_all(&bytes)
            .and_then(|_| staged.flush())
            .map_err(|e| GatewayError::StagingFailed(e.to_string()))?;

        let embedding = encoder
            .embed_image(staged.path())
            .map_err(|e| GatewayError::ProcessingFailed(e.to_string()))?;

        scorer
            .score_image(index, &embedding, &concepts)
            .map_err(|e| GatewayError::ProcessingFailed(e.to_string()))
    })
    .await
    .map_err(|e| GatewayError::ProcessingFailed(format!("image task failed: {}", e)))?
}
