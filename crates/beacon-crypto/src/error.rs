//! # Cryptographic Error Types
//!
//! Structured errors for key management and signing. Uses `thiserror` for
//! ergonomic definitions with diagnostic context. Configuration-class
//! errors (unknown algorithm, missing key material, unsafe rotation
//! interval) are fatal at startup; the server maps them accordingly.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from key material and signing operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The configured signing algorithm is not supported.
    #[error("unknown signing algorithm '{0}'")]
    UnknownAlgorithm(String),

    /// RSA requested without a usable modulus length.
    #[error("RSA algorithm specified, but no valid RSA key length (got {0})")]
    InvalidRsaKeyLen(usize),

    /// Key parsing, encoding, or generation failed.
    #[error("key error: {0}")]
    Key(String),

    /// Rotation is disabled and the expected key file does not exist.
    #[error("signing key file {0} missing and automatic rollover is disabled")]
    MissingKeyMaterial(PathBuf),

    /// The rotation interval is shorter than the longest credential
    /// lifetime signed with this purpose, so a still-valid credential
    /// could outlive its verification key.
    #[error(
        "rollover interval ({interval_secs}s) must be at least the maximum \
         credential lifetime ({max_lifetime_secs}s)"
    )]
    RotationIntervalTooShort {
        interval_secs: u64,
        max_lifetime_secs: u64,
    },

    /// JWT signing or verification failed.
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// A signature did not verify.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// I/O error reading or persisting key files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
