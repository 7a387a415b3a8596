//! # Endpoint Configuration
//!
//! Every federation endpoint is configured as an internal serving path plus
//! an optional externally visible URL. An endpoint with an empty path is
//! disabled; the external URL defaults to the entity id joined with the
//! internal path, so a minimal config only needs `path`.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Internal path / external URL pair for one federation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConf {
    /// Path the endpoint is served under (e.g. `/trust_mark`).
    /// Empty means the endpoint is disabled.
    #[serde(default)]
    pub path: String,

    /// Externally visible URL, advertised in federation metadata.
    /// Defaults to `entity_id + path` when unset.
    #[serde(default)]
    pub url: String,
}

impl EndpointConf {
    /// Endpoint with only an internal path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: String::new(),
        }
    }

    /// Whether this endpoint was configured at all.
    pub fn is_set(&self) -> bool {
        !self.path.is_empty() || !self.url.is_empty()
    }

    /// The externally visible URL, deriving it from the entity id when no
    /// explicit URL was configured.
    pub fn external_url(&self, entity_id: &EntityId) -> String {
        if self.url.is_empty() {
            entity_id.join(&self.path)
        } else {
            self.url.clone()
        }
    }
}
