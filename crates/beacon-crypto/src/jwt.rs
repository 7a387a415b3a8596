//! # JWT Signing and Verification
//!
//! Thin wrappers around `jsonwebtoken` that bind a token to a
//! [`SigningKeyPair`]: the protected header always carries the pair's
//! algorithm, its thumbprint `kid`, and an explicit `typ` so consumers can
//! reject statements presented in the wrong role.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CryptoError;
use crate::jwk::Jwk;
use crate::keypair::SigningKeyPair;

/// Sign `claims` with `pair`, setting `typ` and `kid` in the header.
pub fn sign<T: Serialize>(
    pair: &SigningKeyPair,
    typ: &str,
    claims: &T,
) -> Result<String, CryptoError> {
    let mut header = jsonwebtoken::Header::new(pair.algorithm().jwt_algorithm());
    header.typ = Some(typ.to_string());
    header.kid = Some(pair.kid().to_string());
    Ok(jsonwebtoken::encode(&header, claims, pair.encoding_key())?)
}

/// Verify `token` against the public `jwk` and deserialize its claims.
///
/// The signature is always checked; `exp` is checked when the token
/// carries one, since some signed documents (e.g. the historical keys
/// document) are deliberately unexpiring. Audience is not validated,
/// federation statements do not carry one.
pub fn verify<T: DeserializeOwned>(token: &str, jwk: &Jwk) -> Result<T, CryptoError> {
    let header = jsonwebtoken::decode_header(token)?;
    let mut validation = jsonwebtoken::Validation::new(header.alg);
    validation.validate_aud = false;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    let key = jwk.decoding_key()?;
    let data = jsonwebtoken::decode::<serde_json::Value>(token, &key, &validation)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))?;
    if let Some(exp) = data.claims.get("exp").and_then(serde_json::Value::as_i64) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        if exp < now {
            return Err(CryptoError::VerificationFailed("token expired".to_string()));
        }
    }
    serde_json::from_value(data.claims)
        .map_err(|e| CryptoError::VerificationFailed(format!("claims: {e}")))
}

/// Read the `kid` from a token header without verifying anything.
pub fn header_kid(token: &str) -> Result<Option<String>, CryptoError> {
    Ok(jsonwebtoken::decode_header(token)?.kid)
}

/// Decode a token payload without verifying the signature.
///
/// Only for extracting untrusted hints (e.g. picking the verification key
/// out of a self-signed statement's own `jwks`); never treat the result
/// as authenticated.
pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T, CryptoError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| CryptoError::VerificationFailed("malformed JWT".to_string()))?;
    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| CryptoError::VerificationFailed(format!("payload encoding: {e}")))?;
    serde_json::from_slice(&raw)
        .map_err(|e| CryptoError::VerificationFailed(format!("payload json: {e}")))
}
