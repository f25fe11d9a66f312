//! Client-side trip query engine.
//!
//! Issues trip and journey lookups against an abstract transit-data
//! provider, retries transient network failures with linear backoff,
//! classifies every terminal outcome into a closed taxonomy, and pages
//! additional result windows ("earlier"/"later") into a deduplicated,
//! time-ordered trip collection. A separate pure classifier rates the
//! feasibility of walking transfers between scheduled legs.
//!
//! The provider itself (HTTP, parsing, per-network quirks) is an external
//! collaborator behind the [`provider::ProviderClient`] trait; rendering
//! and persistence are owned by the consuming layer.

pub mod classify;
pub mod domain;
pub mod engine;
pub mod pager;
pub mod provider;
pub mod query;
pub mod transfer;
