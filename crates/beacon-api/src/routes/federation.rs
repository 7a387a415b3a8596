//! Well-known entity configuration endpoint.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use beacon_core::CONTENT_TYPE_ENTITY_STATEMENT;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /.well-known/openid-federation` — this entity's self-signed
/// configuration. Served from a short-lived cache.
pub async fn well_known(State(state): State<AppState>) -> Result<Response, ApiError> {
    let token = state.entity_configuration()?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_ENTITY_STATEMENT)], token).into_response())
}
