//! # Subordinate Endpoints
//!
//! The fetch endpoint serves signed subordinate statements; the list
//! endpoint enumerates registered subordinates; the enroll endpoints
//! admit new subordinates, immediately or after operator review.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use beacon_core::{EntityId, CONTENT_TYPE_ENTITY_STATEMENT};
use beacon_issuer::IssuerError;
use beacon_store::Status;

use crate::error::ApiError;
use crate::routes::require;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    pub sub: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub entity_type: Option<String>,
    /// Restrict to subordinates holding an active trust mark of any
    /// configured type.
    pub trust_marked: Option<bool>,
    /// Restrict to subordinates holding an active mark of this type.
    pub trust_mark_type: Option<String>,
}

/// `GET {fetch}` — the signed subordinate statement for `sub`. Only
/// `Active` registrations are served.
pub async fn fetch(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Response, ApiError> {
    let sub = EntityId::new(require(&params.sub, "sub")?)?;
    let info = state
        .subordinates
        .get(&sub)?
        .filter(|info| info.status.is_active())
        .ok_or_else(|| ApiError::NotFound("subject is not a subordinate of this entity".to_string()))?;
    let token = state
        .signer
        .subordinate_statement(&info)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_ENTITY_STATEMENT)], token).into_response())
}

/// `GET {list}` — entity ids of registered subordinates, optionally
/// narrowed by declared entity type and by held trust marks.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<EntityId>>, ApiError> {
    let mut ids = state.subordinates.ids(params.entity_type.as_deref())?;
    if let Some(trust_mark_type) = params
        .trust_mark_type
        .as_deref()
        .filter(|t| !t.is_empty())
    {
        let active = state.lifecycle.list_active(trust_mark_type, None)?;
        ids.retain(|id| active.contains(id));
    } else if params.trust_marked == Some(true) {
        let types: Vec<String> = state
            .lifecycle
            .issuer()
            .trust_mark_types()
            .map(str::to_string)
            .collect();
        let mut marked = std::collections::BTreeSet::new();
        for ty in &types {
            marked.extend(state.lifecycle.list_active(ty, None)?);
        }
        ids.retain(|id| marked.contains(id));
    }
    Ok(Json(ids))
}

/// `POST {enroll}` — admit `sub` as a subordinate. The candidate's
/// entity configuration is fetched, verified, and run through the
/// admission checker; on success the first subordinate statement is
/// returned.
pub async fn enroll(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Response, ApiError> {
    let sub = EntityId::new(require(&params.sub, "sub")?)?;
    if registration_status(&state, &sub)? == Some(Status::Blocked) {
        return Err(ApiError::Forbidden("subject cannot enroll".to_string()));
    }
    let info = state.enrollment.vet(&sub).await.map_err(admission_error)?;
    state.subordinates.upsert(&info)?;
    tracing::info!(sub = %sub, "subordinate enrolled");
    let token = state
        .signer
        .subordinate_statement(&info)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_ENTITY_STATEMENT)], token).into_response())
}

/// `POST {enroll_request}` — record an enrollment request for operator
/// review. 202 while the registration is pending, 204 when the subject
/// is already an active subordinate.
pub async fn enroll_request(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<StatusCode, ApiError> {
    let sub = EntityId::new(require(&params.sub, "sub")?)?;
    match registration_status(&state, &sub)? {
        Some(Status::Blocked) => {
            return Err(ApiError::Forbidden("subject cannot enroll".to_string()))
        }
        Some(Status::Active) => return Ok(StatusCode::NO_CONTENT),
        Some(Status::Pending) => return Ok(StatusCode::ACCEPTED),
        _ => {}
    }
    let info = state.enrollment.draft(&sub).await.map_err(admission_error)?;
    state.subordinates.upsert(&info)?;
    tracing::info!(sub = %sub, "enrollment request recorded");
    Ok(StatusCode::ACCEPTED)
}

fn registration_status(state: &AppState, sub: &EntityId) -> Result<Option<Status>, ApiError> {
    Ok(state.subordinates.get(sub)?.map(|info| info.status))
}

/// Admission failures map to the wire format without echoing fetch or
/// verification details.
fn admission_error(err: IssuerError) -> ApiError {
    match err {
        IssuerError::EntityConfig(reason) => {
            tracing::debug!(%reason, "entity configuration could not be verified");
            ApiError::NotFound(
                "the entity configuration of the subject could not be obtained".to_string(),
            )
        }
        other => other.into(),
    }
}
