//! # beacon-crypto — Key Material for the Beacon Federation Stack
//!
//! Owns every private signing key in the system and everything derived
//! from them:
//!
//! - [`SigningAlgorithm`]: the closed set of supported JWS algorithms
//!   (ES256/ES384, RS256/RS384/RS512, EdDSA). Unknown algorithm strings
//!   fail at config parse time, never at signing time.
//! - [`SigningKeyPair`]: one generated or loaded key pair, with its
//!   public [`Jwk`] and RFC 7638 thumbprint key id.
//! - [`jwt`]: JWT signing over the active key and JWK-based verification.
//! - [`KeyRing`]: the per-purpose key set. Loads/generates key files
//!   named deterministically by purpose and algorithm, rotates the active
//!   key on a schedule, retains historical keys so credentials signed
//!   before a rotation stay verifiable, and publishes immutable snapshots
//!   so the signing path never observes a half-rotated state.
//!
//! ## Security Invariants
//!
//! - Private key material never implements `Serialize` and never appears
//!   in `Debug` output.
//! - Key files are written with mode 0600 on unix.
//! - Rotation is atomic for readers: they see the old snapshot or the new
//!   one, never a mixture.

pub mod algorithm;
pub mod error;
pub mod jwk;
pub mod jwt;
pub mod keypair;
pub mod rollover;

pub use algorithm::SigningAlgorithm;
pub use error::CryptoError;
pub use jwk::{Jwk, Jwks};
pub use keypair::SigningKeyPair;
pub use rollover::{KeyRing, KeySnapshot, RolloverConf};

/// The signing purpose used for all federation statements issued by a
/// Beacon instance (entity configurations, subordinate statements, trust
/// marks, signed JWK sets).
pub const PURPOSE_FEDERATION: &str = "federation";
