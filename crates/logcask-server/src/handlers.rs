//! Record and health endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use logcask_core::Error;

use crate::models::{PutRequest, RecordResponse};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/db/{key}",
    params(("key" = String, Path, description = "Record key")),
    responses(
        (status = 200, description = "Record found", body = RecordResponse),
        (status = 404, description = "Key not found"),
        (status = 400, description = "Read failed")
    ),
    tag = "db"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RecordResponse>, StatusCode> {
    match state.store.get(&key).await {
        Ok(value) => Ok(Json(RecordResponse { key, value })),
        Err(Error::KeyNotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::BAD_REQUEST),
    }
}

#[utoipa::path(
    post,
    path = "/db/{key}",
    request_body = PutRequest,
    responses(
        (status = 200, description = "Record written; request echoed back", body = PutRequest),
        (status = 400, description = "Malformed body or write failed")
    ),
    tag = "db"
)]
pub async fn put_record(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> Result<Json<PutRequest>, StatusCode> {
    // Any body the decoder rejects is the caller's fault, not ours.
    let Json(request) = payload.map_err(|_| StatusCode::BAD_REQUEST)?;

    state
        .store
        .put(&key, &request.value)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    Ok(Json(request))
}

/// Plain-text health probe. Flips to 500/FAILURE when the health-failure
/// toggle is set, which lets integration setups exercise the balancer's
/// probe handling.
pub async fn health(State(state): State<AppState>) -> Response {
    if state.health_failure {
        (StatusCode::INTERNAL_SERVER_ERROR, "FAILURE").into_response()
    } else {
        (StatusCode::OK, "OK").into_response()
    }
}
