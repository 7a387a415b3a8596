//! # Server Configuration
//!
//! One YAML file describes a Beacon instance: its entity identity, the
//! signing key setup, storage backend, enabled endpoints, and the trust
//! mark catalog. Defaults are chosen so a minimal config needs only
//! `entity_id`, `signing.key_dir`, and `storage.data_dir`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use beacon_api::EndpointsConf;
use beacon_core::EntityId;
use beacon_crypto::{RolloverConf, SigningAlgorithm};
use beacon_issuer::TrustMarkTypeConf;
use beacon_store::StorageConfig;

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8765
}
fn default_algorithm() -> SigningAlgorithm {
    SigningAlgorithm::Es256
}
fn default_rsa_key_len() -> usize {
    2048
}
fn default_statement_lifetime_secs() -> u64 {
    86400
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConf {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConf {
    #[serde(default = "default_algorithm")]
    pub algorithm: SigningAlgorithm,
    /// RSA modulus length in bits, only used with the RS* algorithms.
    #[serde(default = "default_rsa_key_len")]
    pub rsa_key_len: usize,
    pub key_dir: PathBuf,
    #[serde(default)]
    pub rollover: RolloverConf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub entity_id: EntityId,
    #[serde(default)]
    pub organization_name: Option<String>,
    /// Superior entities this one points at in its configuration.
    #[serde(default)]
    pub authority_hints: Vec<EntityId>,
    #[serde(default)]
    pub server: ServerConf,
    pub signing: SigningConf,
    pub storage: StorageConfig,
    #[serde(default)]
    pub endpoints: EndpointsConf,
    #[serde(default)]
    pub trust_marks: Vec<TrustMarkTypeConf>,
    /// Validity of signed entity statements in seconds.
    #[serde(default = "default_statement_lifetime_secs")]
    pub statement_lifetime_secs: u64,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.statement_lifetime_secs == 0 {
            bail!("statement_lifetime_secs must be positive");
        }
        if self.signing.algorithm.is_rsa() && self.signing.rsa_key_len < 2048 {
            bail!(
                "rsa_key_len {} is below the 2048-bit minimum",
                self.signing.rsa_key_len
            );
        }
        let mut seen = std::collections::BTreeSet::new();
        for conf in &self.trust_marks {
            if !seen.insert(conf.trust_mark_type.as_str()) {
                bail!(
                    "trust mark type '{}' is configured twice",
                    conf.trust_mark_type
                );
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
