//! # Key Ring and Automatic Rollover
//!
//! One [`KeyRing`] per signing purpose. The ring owns the on-disk key
//! files under the configured key directory:
//!
//! ```text
//! {purpose}_{ALG}.pem          active private key (PKCS#8, mode 0600)
//! {purpose}_{ALG}.old.0.pem    most recently retired key
//! {purpose}_{ALG}.old.1.pem    next oldest, up to keys_kept files
//! ```
//!
//! Rotation generates a fresh key, shifts the retired files down by one,
//! truncates retention, and only then swaps the in-memory
//! [`KeySnapshot`]. Readers clone an `Arc` under a brief read lock, so a
//! signing operation either sees the full pre-rotation state or the full
//! post-rotation state. A failed rotation leaves the previous snapshot in
//! place and is reported through `tracing`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::algorithm::SigningAlgorithm;
use crate::error::CryptoError;
use crate::jwk::{Jwk, Jwks};
use crate::keypair::SigningKeyPair;

/// Automatic key rollover settings for one signing purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConf {
    /// Whether keys are rotated on a schedule. When disabled, the key
    /// file must already exist; the ring never generates one implicitly.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between rotations. Must be at least the longest lifetime
    /// of any credential signed with this purpose.
    #[serde(default)]
    pub interval_secs: u64,

    /// How many retired keys stay published for verification.
    #[serde(default = "default_keys_kept")]
    pub keys_kept: usize,
}

fn default_keys_kept() -> usize {
    1
}

impl Default for RolloverConf {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 0,
            keys_kept: default_keys_kept(),
        }
    }
}

/// An immutable view of a ring's keys at one point in time.
#[derive(Debug)]
pub struct KeySnapshot {
    active: SigningKeyPair,
    historical: Vec<Jwk>,
}

impl KeySnapshot {
    /// The key pair currently used for signing.
    pub fn active(&self) -> &SigningKeyPair {
        &self.active
    }

    /// Retired public keys, most recently retired first.
    pub fn historical(&self) -> &[Jwk] {
        &self.historical
    }

    /// The currently published JWK set (active key only).
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![self.active.public_jwk().clone()],
        }
    }

    /// Active plus retired public keys, for the historical keys document.
    pub fn all_jwks(&self) -> Jwks {
        let mut keys = vec![self.active.public_jwk().clone()];
        keys.extend(self.historical.iter().cloned());
        Jwks { keys }
    }
}

/// The signing key set for one purpose, with scheduled rollover.
pub struct KeyRing {
    purpose: String,
    algorithm: SigningAlgorithm,
    key_dir: PathBuf,
    conf: RolloverConf,
    rsa_key_len: usize,
    snapshot: RwLock<Arc<KeySnapshot>>,
}

impl KeyRing {
    /// Load the ring from `key_dir`, generating a fresh key if rollover
    /// is enabled and no key file exists yet.
    ///
    /// With rollover disabled a missing key file is a configuration
    /// error: the operator must provision the key explicitly.
    pub fn load(
        purpose: impl Into<String>,
        algorithm: SigningAlgorithm,
        key_dir: impl Into<PathBuf>,
        conf: RolloverConf,
        rsa_key_len: usize,
    ) -> Result<Self, CryptoError> {
        let purpose = purpose.into();
        let key_dir = key_dir.into();
        fs::create_dir_all(&key_dir)?;

        let active_path = key_file_path(&key_dir, &purpose, algorithm, None);
        let active = if active_path.exists() {
            let pem = fs::read_to_string(&active_path)?;
            SigningKeyPair::from_pkcs8_pem(algorithm, &pem)?
        } else if conf.enabled {
            let pair = SigningKeyPair::generate(algorithm, rsa_key_len)?;
            write_key_file(&active_path, &pair.to_pkcs8_pem()?)?;
            pair
        } else {
            return Err(CryptoError::MissingKeyMaterial(active_path));
        };

        let ring = Self {
            purpose,
            algorithm,
            key_dir,
            conf,
            rsa_key_len,
            snapshot: RwLock::new(Arc::new(KeySnapshot {
                active,
                historical: Vec::new(),
            })),
        };
        let historical = ring.read_historical()?;
        let mut guard = ring.snapshot.write();
        let active = guard.active.clone();
        *guard = Arc::new(KeySnapshot { active, historical });
        drop(guard);
        Ok(ring)
    }

    /// Check that the rotation interval cannot retire a key while a
    /// credential signed with it is still valid.
    pub fn validate_interval(&self, max_credential_lifetime_secs: u64) -> Result<(), CryptoError> {
        if self.conf.enabled && self.conf.interval_secs < max_credential_lifetime_secs {
            return Err(CryptoError::RotationIntervalTooShort {
                interval_secs: self.conf.interval_secs,
                max_lifetime_secs: max_credential_lifetime_secs,
            });
        }
        Ok(())
    }

    /// The signing purpose this ring serves.
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// The algorithm every key in this ring uses.
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Whether scheduled rollover is enabled.
    pub fn rollover_enabled(&self) -> bool {
        self.conf.enabled
    }

    /// Clone the current snapshot. Cheap; holds the read lock only for
    /// the `Arc` clone.
    pub fn snapshot(&self) -> Arc<KeySnapshot> {
        self.snapshot.read().clone()
    }

    /// Rotate now: generate a new active key, shift the retired key
    /// files, truncate retention, and publish the new snapshot.
    ///
    /// On any error the previous snapshot stays current.
    pub fn rotate_once(&self) -> Result<(), CryptoError> {
        let next = SigningKeyPair::generate(self.algorithm, self.rsa_key_len)?;
        let pem = next.to_pkcs8_pem()?;

        let kept = self.conf.keys_kept;
        let active_path = self.active_path();
        if kept > 0 {
            let last = self.historical_path(kept - 1);
            if last.exists() {
                fs::remove_file(&last)?;
            }
            for i in (0..kept.saturating_sub(1)).rev() {
                let from = self.historical_path(i);
                if from.exists() {
                    fs::rename(&from, self.historical_path(i + 1))?;
                }
            }
            if active_path.exists() {
                fs::rename(&active_path, self.historical_path(0))?;
            }
        } else if active_path.exists() {
            fs::remove_file(&active_path)?;
        }
        write_key_file(&active_path, &pem)?;

        let historical = self.read_historical()?;
        *self.snapshot.write() = Arc::new(KeySnapshot {
            active: next,
            historical,
        });
        Ok(())
    }

    /// Spawn the background rotation task. Returns `None` when rollover
    /// is disabled. The task never rotates on startup; the first rotation
    /// happens one full interval after the ring was loaded.
    pub fn spawn_rotation(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if !self.conf.enabled {
            return None;
        }
        let ring = self;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(ring.conf.interval_secs));
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match ring.rotate_once() {
                    Ok(()) => {
                        let snapshot = ring.snapshot();
                        tracing::info!(
                            purpose = %ring.purpose,
                            kid = %snapshot.active().kid(),
                            "rotated signing key"
                        );
                    }
                    Err(err) => {
                        tracing::error!(
                            purpose = %ring.purpose,
                            error = %err,
                            "key rotation failed; keeping current signing key"
                        );
                    }
                }
            }
        }))
    }

    fn active_path(&self) -> PathBuf {
        key_file_path(&self.key_dir, &self.purpose, self.algorithm, None)
    }

    fn historical_path(&self, index: usize) -> PathBuf {
        key_file_path(&self.key_dir, &self.purpose, self.algorithm, Some(index))
    }

    fn read_historical(&self) -> Result<Vec<Jwk>, CryptoError> {
        let mut historical = Vec::new();
        for i in 0..self.conf.keys_kept {
            let path = self.historical_path(i);
            if !path.exists() {
                break;
            }
            let pem = fs::read_to_string(&path)?;
            let pair = SigningKeyPair::from_pkcs8_pem(self.algorithm, &pem)?;
            historical.push(pair.public_jwk().clone());
        }
        Ok(historical)
    }
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("purpose", &self.purpose)
            .field("algorithm", &self.algorithm)
            .field("key_dir", &self.key_dir)
            .field("conf", &self.conf)
            .finish_non_exhaustive()
    }
}

fn key_file_path(
    dir: &Path,
    purpose: &str,
    algorithm: SigningAlgorithm,
    index: Option<usize>,
) -> PathBuf {
    match index {
        None => dir.join(format!("{purpose}_{algorithm}.pem")),
        Some(i) => dir.join(format!("{purpose}_{algorithm}.old.{i}.pem")),
    }
}

fn write_key_file(path: &Path, pem: &str) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(pem.as_bytes())?;
        file.flush()
    }
    #[cfg(not(unix))]
    {
        fs::write(path, pem)
    }
}
