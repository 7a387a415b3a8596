//! # beacon-core — Foundational Types for the Beacon Federation Stack
//!
//! Beacon is a federation trust entity: it publishes its own entity
//! configuration, issues subordinate statements about enrolled entities,
//! and issues trust marks to subjects that are entitled to them.
//!
//! This crate holds the types every other Beacon crate agrees on:
//!
//! - [`EntityId`] — a validated federation entity identifier (https URL).
//! - [`EndpointConf`] — internal path / external URL pair for one endpoint.
//! - [`unix_now`] — the unix-seconds claim helper.
//! - [`consts`] — wire constants (content types, claim names, well-known
//!   path).
//! - [`ValidationError`] — the shared request/config validation error.

pub mod consts;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod time;

pub use consts::*;
pub use endpoint::EndpointConf;
pub use entity::EntityId;
pub use error::ValidationError;
pub use time::unix_now;
