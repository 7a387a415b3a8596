//! # Trust Mark Types and Claims
//!
//! [`TrustMarkTypeConf`] is one entry of the issuer's configured trust
//! mark catalog; [`TrustMarkClaims`] is the JWT payload of an issued
//! trust mark.

use beacon_core::EntityId;
use serde::{Deserialize, Serialize};

use crate::checker::EntityChecker;

fn default_lifetime_secs() -> u64 {
    86400
}

/// Configuration for one trust mark type this issuer may issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMarkTypeConf {
    /// The trust mark type identifier, a URL chosen by the federation.
    pub trust_mark_type: String,

    /// Validity of issued trust marks in seconds. Zero means the marks
    /// carry no expiry.
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,

    /// Reference URL describing what the mark attests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,

    /// Delegation JWT from the trust mark owner, when this issuer issues
    /// the mark on the owner's behalf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<String>,

    /// Extra claims copied verbatim into every issued mark.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_claims: serde_json::Map<String, serde_json::Value>,

    /// Entitlement rule for subjects with no stored authorization.
    /// Absent means storage is the only source of entitlement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker: Option<EntityChecker>,
}

/// The payload of an issued trust mark JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMarkClaims {
    pub iss: EntityId,
    pub sub: EntityId,
    pub trust_mark_type: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conf_defaults_lifetime() {
        let conf: TrustMarkTypeConf = serde_json::from_str(
            r#"{"trust_mark_type": "https://ta.example.org/tm/certified"}"#,
        )
        .unwrap();
        assert_eq!(conf.lifetime_secs, 86400);
        assert!(conf.checker.is_none());
    }

    #[test]
    fn claims_flatten_extras_and_skip_absent() {
        let mut extra = serde_json::Map::new();
        extra.insert("policy_uri".to_string(), serde_json::json!("https://x"));
        let claims = TrustMarkClaims {
            iss: EntityId::new("https://ta.example.org").unwrap(),
            sub: EntityId::new("https://rp.example.org").unwrap(),
            trust_mark_type: "https://ta.example.org/tm/certified".to_string(),
            iat: 1700000000,
            exp: None,
            r#ref: None,
            logo_uri: None,
            delegation: None,
            extra,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["policy_uri"], "https://x");
        assert!(json.get("exp").is_none());
        assert!(json.get("ref").is_none());
    }
}
