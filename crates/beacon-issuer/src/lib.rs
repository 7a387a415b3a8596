//! # beacon-issuer — Trust Mark Issuance
//!
//! The authorization and signing core of a Beacon instance:
//!
//! - [`TrustMarkLifecycle`]: the decision point for issue, request,
//!   status, and listing operations over the stored authorization state
//!   machine.
//! - [`EntityChecker`]: the closed entitlement predicate language
//!   evaluated for subjects without stored authorization.
//! - [`EnrollmentGate`]: admission control for subordinate enrollment.
//! - [`EntityConfigSource`]: verified retrieval of subjects' self-signed
//!   entity configurations.
//! - [`TrustMarkIssuer`] and [`StatementSigner`]: the signing facades for
//!   trust marks and entity statements respectively.

pub mod checker;
pub mod engine;
pub mod enrollment;
pub mod entity_config;
pub mod error;
pub mod issuer;
pub mod statements;
pub mod trust_mark;

pub use checker::{CheckDecision, EntityChecker};
pub use engine::{RequestOutcome, TrustMarkLifecycle};
pub use enrollment::EnrollmentGate;
pub use entity_config::{
    verify_entity_configuration, EntityConfigSource, EntityStatementPayload,
    HttpEntityConfigSource,
};
pub use error::IssuerError;
pub use issuer::TrustMarkIssuer;
pub use statements::{FederationEndpoints, HistoricalKeysClaims, StatementSigner};
pub use trust_mark::{TrustMarkClaims, TrustMarkTypeConf};
