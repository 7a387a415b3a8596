//! Shared application state for the HTTP handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use beacon_issuer::{EnrollmentGate, StatementSigner, TrustMarkLifecycle};
use beacon_store::SubordinateStore;

use crate::error::ApiError;

/// How long a signed entity configuration is reused before re-signing.
/// Keeps the well-known endpoint cheap under polling without serving a
/// stale key set for long after a rotation.
const ENTITY_CONFIG_TTL: Duration = Duration::from_secs(5);

struct CachedStatement {
    token: String,
    signed_at: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<TrustMarkLifecycle>,
    pub signer: Arc<StatementSigner>,
    pub subordinates: Arc<dyn SubordinateStore>,
    pub enrollment: Arc<EnrollmentGate>,
    entity_config_cache: Arc<Mutex<Option<CachedStatement>>>,
}

impl AppState {
    pub fn new(
        lifecycle: Arc<TrustMarkLifecycle>,
        signer: Arc<StatementSigner>,
        subordinates: Arc<dyn SubordinateStore>,
        enrollment: Arc<EnrollmentGate>,
    ) -> Self {
        Self {
            lifecycle,
            signer,
            subordinates,
            enrollment,
            entity_config_cache: Arc::new(Mutex::new(None)),
        }
    }

    /// The signed entity configuration, re-signed at most once per TTL.
    pub fn entity_configuration(&self) -> Result<String, ApiError> {
        let mut cache = self.entity_config_cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.signed_at.elapsed() < ENTITY_CONFIG_TTL {
                return Ok(cached.token.clone());
            }
        }
        let token = self
            .signer
            .entity_configuration()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        *cache = Some(CachedStatement {
            token: token.clone(),
            signed_at: Instant::now(),
        });
        Ok(token)
    }
}
