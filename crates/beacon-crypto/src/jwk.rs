//! # JWK / JWKS Types
//!
//! Public-key JSON Web Key representations published by the federation
//! entity: in its entity configuration, in subordinate statements, and in
//! the signed historical keys document. Only public members are ever
//! representable here; private key material lives in
//! [`SigningKeyPair`](crate::keypair::SigningKeyPair) and cannot reach a
//! `Jwk`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// A public JSON Web Key.
///
/// Member presence depends on `kty`: EC keys carry `crv`/`x`/`y`, RSA keys
/// carry `n`/`e`, OKP (Ed25519) keys carry `crv`/`x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `"EC"`, `"RSA"`, or `"OKP"`.
    pub kty: String,

    /// Key id — the RFC 7638 thumbprint of this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Intended use, always `"sig"` for Beacon keys.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// JWA algorithm this key is used with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Curve name (EC and OKP keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// X coordinate (EC) or public key bytes (OKP), base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate (EC keys), base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Modulus (RSA keys), base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Public exponent (RSA keys), base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// Compute the RFC 7638 thumbprint: SHA-256 over the canonical JSON of
    /// the required members, base64url-encoded.
    ///
    /// `serde_json::Map` is ordered lexicographically, which is exactly the
    /// member ordering RFC 7638 requires.
    pub fn thumbprint(&self) -> Result<String, CryptoError> {
        let mut members = serde_json::Map::new();
        let require = |field: &Option<String>, name: &str| {
            field
                .clone()
                .ok_or_else(|| CryptoError::Key(format!("jwk missing '{name}' for thumbprint")))
        };
        match self.kty.as_str() {
            "EC" => {
                members.insert("crv".into(), require(&self.crv, "crv")?.into());
                members.insert("kty".into(), "EC".into());
                members.insert("x".into(), require(&self.x, "x")?.into());
                members.insert("y".into(), require(&self.y, "y")?.into());
            }
            "RSA" => {
                members.insert("e".into(), require(&self.e, "e")?.into());
                members.insert("kty".into(), "RSA".into());
                members.insert("n".into(), require(&self.n, "n")?.into());
            }
            "OKP" => {
                members.insert("crv".into(), require(&self.crv, "crv")?.into());
                members.insert("kty".into(), "OKP".into());
                members.insert("x".into(), require(&self.x, "x")?.into());
            }
            other => {
                return Err(CryptoError::Key(format!(
                    "cannot thumbprint unknown key type '{other}'"
                )))
            }
        }
        let canonical = serde_json::to_vec(&serde_json::Value::Object(members))
            .map_err(|e| CryptoError::Key(e.to_string()))?;
        let digest = Sha256::digest(&canonical);
        Ok(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Build a `jsonwebtoken` decoding key for verification.
    pub fn decoding_key(&self) -> Result<jsonwebtoken::DecodingKey, CryptoError> {
        let missing = |name: &str| CryptoError::Key(format!("jwk missing '{name}'"));
        match self.kty.as_str() {
            "EC" => {
                let x = self.x.as_deref().ok_or_else(|| missing("x"))?;
                let y = self.y.as_deref().ok_or_else(|| missing("y"))?;
                Ok(jsonwebtoken::DecodingKey::from_ec_components(x, y)?)
            }
            "RSA" => {
                let n = self.n.as_deref().ok_or_else(|| missing("n"))?;
                let e = self.e.as_deref().ok_or_else(|| missing("e"))?;
                Ok(jsonwebtoken::DecodingKey::from_rsa_components(n, e)?)
            }
            "OKP" => {
                let x = self.x.as_deref().ok_or_else(|| missing("x"))?;
                Ok(jsonwebtoken::DecodingKey::from_ed_components(x)?)
            }
            other => Err(CryptoError::Key(format!(
                "cannot verify with unknown key type '{other}'"
            ))),
        }
    }
}

/// An ordered set of public JWKs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Find a key by its `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
