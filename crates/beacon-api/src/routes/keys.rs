//! Historical keys endpoint.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use beacon_core::CONTENT_TYPE_JWK_SET;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET {historical_keys}` — the signed document listing the active
/// federation key and every retired key still in retention, so relying
/// parties can verify statements signed before a rotation.
pub async fn historical(State(state): State<AppState>) -> Result<Response, ApiError> {
    let token = state
        .signer
        .historical_keys()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_JWK_SET)], token).into_response())
}
