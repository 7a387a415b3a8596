//! # beacon-api — HTTP Surface
//!
//! Assembles the axum router from the endpoint configuration. Only
//! configured endpoints are routed; the well-known entity configuration
//! is always served because its path is fixed by the federation
//! protocol.

pub mod endpoints;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use endpoints::{EndpointsConf, EnrollConf};
pub use error::{ApiError, ErrorBody};
pub use state::AppState;

/// Build the router for the configured endpoints.
pub fn router(state: AppState, endpoints: &EndpointsConf) -> Router {
    let mut router = Router::new().route(
        beacon_core::WELL_KNOWN_FEDERATION_PATH,
        get(routes::federation::well_known),
    );
    if endpoints.trust_mark.is_set() {
        router = router.route(&endpoints.trust_mark.path, get(routes::trust_marks::issue));
    }
    if endpoints.trust_mark_status.is_set() {
        router = router.route(
            &endpoints.trust_mark_status.path,
            get(routes::trust_marks::status),
        );
    }
    if endpoints.trust_mark_request.is_set() {
        router = router.route(
            &endpoints.trust_mark_request.path,
            post(routes::trust_marks::request),
        );
    }
    if endpoints.trust_mark_list.is_set() {
        router = router.route(
            &endpoints.trust_mark_list.path,
            get(routes::trust_marks::list),
        );
    }
    if endpoints.fetch.is_set() {
        router = router.route(&endpoints.fetch.path, get(routes::subordinates::fetch));
    }
    if endpoints.list.is_set() {
        router = router.route(&endpoints.list.path, get(routes::subordinates::list));
    }
    if endpoints.historical_keys.is_set() {
        router = router.route(&endpoints.historical_keys.path, get(routes::keys::historical));
    }
    if endpoints.enroll.endpoint.is_set() {
        router = router.route(
            &endpoints.enroll.endpoint.path,
            post(routes::subordinates::enroll),
        );
    }
    if endpoints.enroll_request.is_set() {
        router = router.route(
            &endpoints.enroll_request.path,
            post(routes::subordinates::enroll_request),
        );
    }
    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
