//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps lifecycle and validation errors to the wire format federation
//! clients expect: a JSON body with an `error` code and an
//! `error_description`. Internal error details are logged, never
//! returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use beacon_issuer::IssuerError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub error_description: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required or malformed request parameter (400).
    #[error("{0}")]
    BadRequest(String),

    /// Unknown trust mark type, unknown subordinate, or a subject that
    /// is not entitled (404).
    #[error("{0}")]
    NotFound(String),

    /// The subject is blocked for the requested trust mark type (403).
    #[error("{0}")]
    Forbidden(String),

    /// The request was recorded and awaits operator approval (202).
    /// Not a failure, but it shares the error wire format.
    #[error("{0}")]
    Accepted(String),

    /// Storage or signing failed (500). The message is logged but not
    /// returned to the client.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Accepted(_) => (StatusCode::ACCEPTED, "approval_pending"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let description = match &self {
            Self::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        };

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: code.to_string(),
            error_description: description,
        };
        (status, Json(body)).into_response()
    }
}

impl From<IssuerError> for ApiError {
    fn from(err: IssuerError) -> Self {
        match err {
            IssuerError::UnknownTrustMarkType(_) | IssuerError::NotEntitled { .. } => {
                Self::NotFound(err.to_string())
            }
            IssuerError::ApprovalPending => Self::Accepted(err.to_string()),
            IssuerError::SubjectBlocked | IssuerError::EnrollmentDenied { .. } => {
                Self::Forbidden(err.to_string())
            }
            IssuerError::EntityConfig(ref reason) => {
                tracing::debug!(%reason, "entity configuration could not be verified");
                Self::NotFound("subject not entitled for this trust mark".to_string())
            }
            IssuerError::Storage(_) | IssuerError::Crypto(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<beacon_core::ValidationError> for ApiError {
    fn from(err: beacon_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<beacon_store::StorageError> for ApiError {
    fn from(err: beacon_store::StorageError) -> Self {
        ApiError::from(IssuerError::from(err))
    }
}
