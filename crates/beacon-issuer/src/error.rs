//! Issuance error types.
//!
//! Variants correspond one-to-one with the externally observable
//! outcomes of the trust mark lifecycle, so the HTTP layer can map them
//! to status codes without inspecting strings.

use thiserror::Error;

use beacon_crypto::CryptoError;
use beacon_store::StorageError;

/// Errors from the trust mark lifecycle and signing facade.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// The trust mark type is not one this issuer is configured for.
    #[error("'trust_mark_type' not known")]
    UnknownTrustMarkType(String),

    /// The subject is neither entitled in storage nor granted by the
    /// type's entitlement checker.
    #[error("subject not entitled for this trust mark")]
    NotEntitled { reason: String },

    /// The subject has a pending request awaiting operator approval.
    #[error("approval pending")]
    ApprovalPending,

    /// The subject is blocked for this trust mark type.
    #[error("subject cannot obtain this trust mark")]
    SubjectBlocked,

    /// The subject did not satisfy the subordinate admission checker.
    /// The reason stays in the logs; the wire message does not echo it.
    #[error("subject cannot enroll")]
    EnrollmentDenied { reason: String },

    /// The subject's entity configuration could not be obtained or did
    /// not verify.
    #[error("entity configuration: {0}")]
    EntityConfig(String),

    /// Storage failed underneath a lifecycle operation.
    #[error(transparent)]
    Storage(StorageError),

    /// Signing or key handling failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<StorageError> for IssuerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::SubjectBlocked { .. } => IssuerError::SubjectBlocked,
            other => IssuerError::Storage(other),
        }
    }
}
