//! Endpoint configuration for the HTTP surface.
//!
//! Each endpoint defaults to its conventional path; an operator disables
//! one by setting an empty path. The well-known entity configuration is
//! always served, its path is fixed by the federation protocol.

use beacon_core::{EndpointConf, EntityId};
use beacon_issuer::{EntityChecker, FederationEndpoints};
use serde::{Deserialize, Serialize};

fn default_fetch() -> EndpointConf {
    EndpointConf::from_path("/fetch")
}
fn default_list() -> EndpointConf {
    EndpointConf::from_path("/list")
}
fn default_trust_mark() -> EndpointConf {
    EndpointConf::from_path("/trustmark")
}
fn default_trust_mark_status() -> EndpointConf {
    EndpointConf::from_path("/trustmark/status")
}
fn default_trust_mark_request() -> EndpointConf {
    EndpointConf::from_path("/trustmark/request")
}
fn default_trust_mark_list() -> EndpointConf {
    EndpointConf::from_path("/trustmark/list")
}
fn default_historical_keys() -> EndpointConf {
    EndpointConf::from_path("/historical-keys")
}

/// The enroll endpoint and its optional admission checker. Without a
/// checker, every entity that publishes a verifiable configuration is
/// admitted, so the endpoint stays disabled until configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollConf {
    #[serde(flatten)]
    pub endpoint: EndpointConf,
    #[serde(default)]
    pub checker: Option<EntityChecker>,
}

/// The configurable federation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConf {
    #[serde(default = "default_fetch")]
    pub fetch: EndpointConf,
    #[serde(default = "default_list")]
    pub list: EndpointConf,
    #[serde(default = "default_trust_mark")]
    pub trust_mark: EndpointConf,
    #[serde(default = "default_trust_mark_status")]
    pub trust_mark_status: EndpointConf,
    #[serde(default = "default_trust_mark_request")]
    pub trust_mark_request: EndpointConf,
    #[serde(default = "default_trust_mark_list")]
    pub trust_mark_list: EndpointConf,
    #[serde(default = "default_historical_keys")]
    pub historical_keys: EndpointConf,
    /// Subordinate enrollment, disabled unless a path is configured.
    #[serde(default)]
    pub enroll: EnrollConf,
    /// Operator-reviewed enrollment requests, disabled unless a path is
    /// configured.
    #[serde(default)]
    pub enroll_request: EndpointConf,
}

impl Default for EndpointsConf {
    fn default() -> Self {
        Self {
            fetch: default_fetch(),
            list: default_list(),
            trust_mark: default_trust_mark(),
            trust_mark_status: default_trust_mark_status(),
            trust_mark_request: default_trust_mark_request(),
            trust_mark_list: default_trust_mark_list(),
            historical_keys: default_historical_keys(),
            enroll: EnrollConf::default(),
            enroll_request: EndpointConf::default(),
        }
    }
}

impl EndpointsConf {
    /// The external URLs advertised in the `federation_entity` metadata.
    /// Only enabled endpoints are advertised; the request and enrollment
    /// endpoints have no standard metadata key.
    pub fn federation_endpoints(&self, entity_id: &EntityId) -> FederationEndpoints {
        let advertise = |ep: &EndpointConf| ep.is_set().then(|| ep.external_url(entity_id));
        FederationEndpoints {
            federation_fetch_endpoint: advertise(&self.fetch),
            federation_list_endpoint: advertise(&self.list),
            federation_trust_mark_endpoint: advertise(&self.trust_mark),
            federation_trust_mark_status_endpoint: advertise(&self.trust_mark_status),
            federation_trust_mark_list_endpoint: advertise(&self.trust_mark_list),
            federation_historical_keys_endpoint: advertise(&self.historical_keys),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_but_enrollment() {
        let conf = EndpointsConf::default();
        assert_eq!(conf.trust_mark.path, "/trustmark");
        assert!(conf.historical_keys.is_set());
        assert!(!conf.enroll.endpoint.is_set());
        assert!(!conf.enroll_request.is_set());
    }

    #[test]
    fn enroll_config_carries_a_checker() {
        let conf: EndpointsConf = serde_json::from_str(
            r#"{"enroll": {
                "path": "/enroll",
                "checker": {"type": "entity_types", "entity_types": ["openid_relying_party"]}
            }}"#,
        )
        .unwrap();
        assert!(conf.enroll.endpoint.is_set());
        assert_eq!(conf.enroll.endpoint.path, "/enroll");
        assert!(conf.enroll.checker.is_some());
    }

    #[test]
    fn empty_path_disables_and_is_not_advertised() {
        let conf: EndpointsConf = serde_json::from_str(
            r#"{"list": {"path": ""}}"#,
        )
        .unwrap();
        assert!(!conf.list.is_set());
        assert!(conf.fetch.is_set());

        let entity = EntityId::new("https://ta.example.org").unwrap();
        let endpoints = conf.federation_endpoints(&entity);
        assert!(endpoints.federation_list_endpoint.is_none());
        assert_eq!(
            endpoints.federation_trust_mark_endpoint.as_deref(),
            Some("https://ta.example.org/trustmark")
        );
    }
}
