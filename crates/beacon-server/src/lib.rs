//! # beacon-server — Service Bootstrap
//!
//! Wires a validated [`Config`] into a running instance: key ring load
//! and rotation task, storage backend, lifecycle engine, statement
//! signer, and the axum service.

pub mod config;

use std::sync::Arc;

use anyhow::Context;

use beacon_api::AppState;
use beacon_crypto::{KeyRing, PURPOSE_FEDERATION};
use beacon_issuer::{
    EnrollmentGate, EntityConfigSource, HttpEntityConfigSource, StatementSigner, TrustMarkIssuer,
    TrustMarkLifecycle,
};
use beacon_store::open_storage;

pub use config::Config;

/// Run the server until the listener fails or the process is stopped.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let ring = Arc::new(
        KeyRing::load(
            PURPOSE_FEDERATION,
            config.signing.algorithm,
            &config.signing.key_dir,
            config.signing.rollover.clone(),
            config.signing.rsa_key_len,
        )
        .context("loading the federation key ring")?,
    );

    let issuer = Arc::new(TrustMarkIssuer::new(
        config.entity_id.clone(),
        ring.clone(),
        config.trust_marks.clone(),
    ));

    // A rotation faster than the longest-lived credential would retire
    // keys that are still needed for verification.
    let max_lifetime = issuer
        .max_lifetime_secs()
        .max(config.statement_lifetime_secs);
    ring.validate_interval(max_lifetime)
        .context("validating the key rollover interval")?;
    let rotation_task = ring.clone().spawn_rotation();
    if rotation_task.is_some() {
        tracing::info!(
            algorithm = %ring.algorithm(),
            "automatic key rollover enabled"
        );
    }

    let stores = open_storage(&config.storage).context("opening storage")?;

    let entity_configs: Arc<dyn EntityConfigSource> =
        Arc::new(HttpEntityConfigSource::new().context("building the entity config client")?);
    let lifecycle = Arc::new(TrustMarkLifecycle::new(
        issuer,
        stores.trust_marks.clone(),
        entity_configs.clone(),
    ));
    let enrollment = Arc::new(EnrollmentGate::new(
        config.endpoints.enroll.checker.clone(),
        entity_configs,
    ));
    let signer = Arc::new(StatementSigner::new(
        config.entity_id.clone(),
        ring,
        config.statement_lifetime_secs,
        config.organization_name.clone(),
        config.endpoints.federation_endpoints(&config.entity_id),
        config.authority_hints.clone(),
    ));

    let state = AppState::new(lifecycle, signer, stores.subordinates.clone(), enrollment);
    let app = beacon_api::router(state, &config.endpoints);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        entity_id = %config.entity_id,
        %addr,
        trust_mark_types = config.trust_marks.len(),
        "beacon listening"
    );
    let result = axum::serve(listener, app).await;

    if let Some(task) = rotation_task {
        task.abort();
    }
    result.context("serving HTTP")
}
