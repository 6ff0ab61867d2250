//! Request handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reef_auth::Principal;
use reef_types::ShardManifest;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

/// `GET /health`.
pub(crate) async fn health() -> &'static str {
    "ok"
}

/// `PUT /objects/{*key}`: store the body and return its manifest.
#[tracing::instrument(skip(state, principal, body), fields(user = %principal.user_id, size = body.len()))]
pub(crate) async fn put_object_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<ShardManifest>, ApiError> {
    let manifest = state.engine.put_object(&key, &body).await?;
    info!(key, shards = manifest.len(), "object stored");
    Ok(Json(manifest))
}

/// `POST /objects/decode`: rebuild the payload a manifest describes.
#[tracing::instrument(skip(state, principal, body), fields(user = %principal.user_id))]
pub(crate) async fn decode_object_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let manifest = ShardManifest::from_slice(&body)?;
    let payload = state.engine.get_object(&manifest).await?;
    info!(size = payload.len(), "object decoded");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(payload),
    )
        .into_response())
}
