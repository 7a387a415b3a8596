//! # Signing Key Pairs
//!
//! One private/public key pair bound to a JWS algorithm. Key pairs are
//! generated with the OS CSPRNG or loaded from PKCS#8 PEM, and expose
//! exactly three derived artifacts: the public [`Jwk`], the RFC 7638
//! thumbprint used as `kid`, and a `jsonwebtoken` encoding key for
//! signing.
//!
//! ## Security Invariants
//!
//! - `SigningKeyPair` does not implement `Serialize`; the only way key
//!   material leaves this type is [`SigningKeyPair::to_pkcs8_pem`], used
//!   by the key ring for 0600 key files.
//! - `Debug` output never includes private material.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rand_core::OsRng;
use rsa::traits::PublicKeyParts;

use crate::algorithm::SigningAlgorithm;
use crate::error::CryptoError;
use crate::jwk::Jwk;

/// Private key material for one supported algorithm family.
#[derive(Clone)]
enum KeyMaterial {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    Rsa(Box<rsa::RsaPrivateKey>),
    Ed25519(ed25519_dalek::SigningKey),
}

/// A signing key pair with its derived public JWK and key id.
#[derive(Clone)]
pub struct SigningKeyPair {
    algorithm: SigningAlgorithm,
    kid: String,
    jwk: Jwk,
    encoding_key: jsonwebtoken::EncodingKey,
    material: KeyMaterial,
}

impl SigningKeyPair {
    /// Generate a fresh key pair for `algorithm` using the OS CSPRNG.
    ///
    /// `rsa_key_len` is the modulus length in bits, only consulted for the
    /// RSA algorithms; a non-positive or undersized value is rejected.
    pub fn generate(
        algorithm: SigningAlgorithm,
        rsa_key_len: usize,
    ) -> Result<Self, CryptoError> {
        let material = match algorithm {
            SigningAlgorithm::Es256 => KeyMaterial::P256(p256::SecretKey::random(&mut OsRng)),
            SigningAlgorithm::Es384 => KeyMaterial::P384(p384::SecretKey::random(&mut OsRng)),
            SigningAlgorithm::Rs256 | SigningAlgorithm::Rs384 | SigningAlgorithm::Rs512 => {
                if rsa_key_len < 2048 {
                    return Err(CryptoError::InvalidRsaKeyLen(rsa_key_len));
                }
                let sk = rsa::RsaPrivateKey::new(&mut OsRng, rsa_key_len)
                    .map_err(|e| CryptoError::Key(format!("RSA key generation failed: {e}")))?;
                KeyMaterial::Rsa(Box::new(sk))
            }
            SigningAlgorithm::EdDsa => {
                KeyMaterial::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng))
            }
        };
        Self::from_material(algorithm, material)
    }

    /// Load a key pair from a PKCS#8 PEM document.
    ///
    /// The PEM must contain a key of the family `algorithm` expects;
    /// a mismatch fails as a key parse error.
    pub fn from_pkcs8_pem(
        algorithm: SigningAlgorithm,
        pem: &str,
    ) -> Result<Self, CryptoError> {
        let parse_err =
            |e: &dyn std::fmt::Display| CryptoError::Key(format!("invalid PKCS#8 key: {e}"));
        let material = match algorithm {
            SigningAlgorithm::Es256 => KeyMaterial::P256(
                p256::SecretKey::from_pkcs8_pem(pem).map_err(|e| parse_err(&e))?,
            ),
            SigningAlgorithm::Es384 => KeyMaterial::P384(
                p384::SecretKey::from_pkcs8_pem(pem).map_err(|e| parse_err(&e))?,
            ),
            SigningAlgorithm::Rs256 | SigningAlgorithm::Rs384 | SigningAlgorithm::Rs512 => {
                KeyMaterial::Rsa(Box::new(
                    rsa::RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| parse_err(&e))?,
                ))
            }
            SigningAlgorithm::EdDsa => KeyMaterial::Ed25519(
                ed25519_dalek::SigningKey::from_pkcs8_pem(pem).map_err(|e| parse_err(&e))?,
            ),
        };
        Self::from_material(algorithm, material)
    }

    fn from_material(
        algorithm: SigningAlgorithm,
        material: KeyMaterial,
    ) -> Result<Self, CryptoError> {
        let mut jwk = build_public_jwk(algorithm, &material);
        let kid = jwk.thumbprint()?;
        jwk.kid = Some(kid.clone());

        let pem = encode_pkcs8_pem(&material)?;
        let encoding_key = match material {
            KeyMaterial::P256(_) | KeyMaterial::P384(_) => {
                jsonwebtoken::EncodingKey::from_ec_pem(pem.as_bytes())?
            }
            KeyMaterial::Rsa(_) => jsonwebtoken::EncodingKey::from_rsa_pem(pem.as_bytes())?,
            KeyMaterial::Ed25519(_) => jsonwebtoken::EncodingKey::from_ed_pem(pem.as_bytes())?,
        };

        Ok(Self {
            algorithm,
            kid,
            jwk,
            encoding_key,
            material,
        })
    }

    /// Export the private key as a PKCS#8 PEM document.
    pub fn to_pkcs8_pem(&self) -> Result<String, CryptoError> {
        encode_pkcs8_pem(&self.material)
    }

    /// The JWS algorithm this key signs with.
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// The RFC 7638 thumbprint key id.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public JWK (with `kid`, `use`, and `alg` populated).
    pub fn public_jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// The `jsonwebtoken` encoding key for signing.
    pub fn encoding_key(&self) -> &jsonwebtoken::EncodingKey {
        &self.encoding_key
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

fn encode_pkcs8_pem(material: &KeyMaterial) -> Result<String, CryptoError> {
    let encode_err =
        |e: &dyn std::fmt::Display| CryptoError::Key(format!("PKCS#8 encoding failed: {e}"));
    let pem = match material {
        KeyMaterial::P256(sk) => sk.to_pkcs8_pem(LineEnding::LF).map_err(|e| encode_err(&e))?,
        KeyMaterial::P384(sk) => sk.to_pkcs8_pem(LineEnding::LF).map_err(|e| encode_err(&e))?,
        KeyMaterial::Rsa(sk) => sk.to_pkcs8_pem(LineEnding::LF).map_err(|e| encode_err(&e))?,
        KeyMaterial::Ed25519(sk) => {
            sk.to_pkcs8_pem(LineEnding::LF).map_err(|e| encode_err(&e))?
        }
    };
    Ok(pem.to_string())
}

fn build_public_jwk(algorithm: SigningAlgorithm, material: &KeyMaterial) -> Jwk {
    let mut jwk = Jwk {
        kty: String::new(),
        kid: None,
        key_use: Some("sig".to_string()),
        alg: Some(algorithm.as_str().to_string()),
        crv: None,
        x: None,
        y: None,
        n: None,
        e: None,
    };
    match material {
        KeyMaterial::P256(sk) => {
            let point = sk.public_key().to_encoded_point(false);
            jwk.kty = "EC".to_string();
            jwk.crv = Some("P-256".to_string());
            jwk.x = point.x().map(|x| URL_SAFE_NO_PAD.encode(x));
            jwk.y = point.y().map(|y| URL_SAFE_NO_PAD.encode(y));
        }
        KeyMaterial::P384(sk) => {
            let point = sk.public_key().to_encoded_point(false);
            jwk.kty = "EC".to_string();
            jwk.crv = Some("P-384".to_string());
            jwk.x = point.x().map(|x| URL_SAFE_NO_PAD.encode(x));
            jwk.y = point.y().map(|y| URL_SAFE_NO_PAD.encode(y));
        }
        KeyMaterial::Rsa(sk) => {
            let pk = rsa::RsaPublicKey::from(sk.as_ref());
            jwk.kty = "RSA".to_string();
            jwk.n = Some(URL_SAFE_NO_PAD.encode(pk.n().to_bytes_be()));
            jwk.e = Some(URL_SAFE_NO_PAD.encode(pk.e().to_bytes_be()));
        }
        KeyMaterial::Ed25519(sk) => {
            jwk.kty = "OKP".to_string();
            jwk.crv = Some("Ed25519".to_string());
            jwk.x = Some(URL_SAFE_NO_PAD.encode(sk.verifying_key().to_bytes()));
        }
    }
    jwk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_ed25519() {
        let kp = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        assert_eq!(kp.algorithm(), SigningAlgorithm::EdDsa);
        assert_eq!(kp.public_jwk().kty, "OKP");
        assert_eq!(kp.public_jwk().crv.as_deref(), Some("Ed25519"));
        assert_eq!(kp.public_jwk().kid.as_deref(), Some(kp.kid()));
    }

    #[test]
    fn generate_es256_and_es384_have_distinct_curves() {
        let es256 = SigningKeyPair::generate(SigningAlgorithm::Es256, 0).unwrap();
        let es384 = SigningKeyPair::generate(SigningAlgorithm::Es384, 0).unwrap();
        assert_eq!(es256.public_jwk().crv.as_deref(), Some("P-256"));
        assert_eq!(es384.public_jwk().crv.as_deref(), Some("P-384"));
        assert!(es256.public_jwk().y.is_some());
    }

    #[test]
    fn rsa_requires_key_len() {
        let err = SigningKeyPair::generate(SigningAlgorithm::Rs256, 0).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidRsaKeyLen(0)));
        let err = SigningKeyPair::generate(SigningAlgorithm::Rs256, 1024).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidRsaKeyLen(1024)));
    }

    #[test]
    fn generate_rsa_2048() {
        let kp = SigningKeyPair::generate(SigningAlgorithm::Rs256, 2048).unwrap();
        assert_eq!(kp.public_jwk().kty, "RSA");
        assert_eq!(kp.public_jwk().e.as_deref(), Some("AQAB"));
    }

    #[test]
    fn pem_roundtrip_preserves_kid() {
        let kp = SigningKeyPair::generate(SigningAlgorithm::Es256, 0).unwrap();
        let pem = kp.to_pkcs8_pem().unwrap();
        assert!(pem.contains("BEGIN PRIVATE KEY"));
        let loaded = SigningKeyPair::from_pkcs8_pem(SigningAlgorithm::Es256, &pem).unwrap();
        assert_eq!(loaded.kid(), kp.kid());
        assert_eq!(loaded.public_jwk(), kp.public_jwk());
    }

    #[test]
    fn pem_algorithm_mismatch_fails() {
        let kp = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let pem = kp.to_pkcs8_pem().unwrap();
        assert!(SigningKeyPair::from_pkcs8_pem(SigningAlgorithm::Es256, &pem).is_err());
    }

    #[test]
    fn distinct_keys_distinct_kids() {
        let a = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let b = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        assert_ne!(a.kid(), b.kid());
    }

    #[test]
    fn debug_does_not_leak_material() {
        let kp = SigningKeyPair::generate(SigningAlgorithm::EdDsa, 0).unwrap();
        let debug = format!("{kp:?}");
        assert!(debug.contains("SigningKeyPair"));
        assert!(!debug.contains("PRIVATE"));
    }
}
