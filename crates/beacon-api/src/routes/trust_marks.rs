//! # Trust Mark Endpoints
//!
//! Issuance, status, subject-initiated requests, and the listing of
//! trust-marked entities. All authorization decisions live in the
//! lifecycle engine; these handlers only translate between HTTP and the
//! engine's vocabulary.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use beacon_core::{EntityId, CONTENT_TYPE_TRUST_MARK};
use beacon_issuer::RequestOutcome;

use crate::error::ApiError;
use crate::routes::require;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrustMarkParams {
    pub trust_mark_type: Option<String>,
    pub sub: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub active: bool,
}

/// `GET {trust_mark}` — issue a trust mark for `sub`.
pub async fn issue(
    State(state): State<AppState>,
    Query(params): Query<TrustMarkParams>,
) -> Result<Response, ApiError> {
    let trust_mark_type = require(&params.trust_mark_type, "trust_mark_type")?;
    let sub = EntityId::new(require(&params.sub, "sub")?)?;
    let token = state.lifecycle.issue(trust_mark_type, &sub).await?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_TRUST_MARK)], token).into_response())
}

/// `GET {trust_mark_status}` — whether `sub` holds an active
/// entitlement.
pub async fn status(
    State(state): State<AppState>,
    Query(params): Query<TrustMarkParams>,
) -> Result<Json<StatusBody>, ApiError> {
    let trust_mark_type = require(&params.trust_mark_type, "trust_mark_type")?;
    let sub = EntityId::new(require(&params.sub, "sub")?)?;
    let active = state.lifecycle.is_active(trust_mark_type, &sub)?;
    Ok(Json(StatusBody { active }))
}

/// `POST {trust_mark_request}` — record a subject-initiated request.
/// 202 when the request awaits approval, 204 when the subject is
/// already entitled.
pub async fn request(
    State(state): State<AppState>,
    Query(params): Query<TrustMarkParams>,
) -> Result<StatusCode, ApiError> {
    let trust_mark_type = require(&params.trust_mark_type, "trust_mark_type")?;
    let sub = EntityId::new(require(&params.sub, "sub")?)?;
    match state.lifecycle.request(trust_mark_type, &sub)? {
        RequestOutcome::Pending => Ok(StatusCode::ACCEPTED),
        RequestOutcome::AlreadyActive => Ok(StatusCode::NO_CONTENT),
    }
}

/// `GET {trust_mark_list}` — entity ids holding this mark. With `sub`,
/// a one-element (or empty) list narrowed to that subject.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<TrustMarkParams>,
) -> Result<Json<Vec<EntityId>>, ApiError> {
    let trust_mark_type = require(&params.trust_mark_type, "trust_mark_type")?;
    let sub = params
        .sub
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(EntityId::new)
        .transpose()?;
    let subjects = state.lifecycle.list_active(trust_mark_type, sub.as_ref())?;
    Ok(Json(subjects))
}
