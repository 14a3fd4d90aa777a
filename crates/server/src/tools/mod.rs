//! MCP tool implementations.
//!
//! This module contains all tools exposed by the favicache server.

pub mod cache;
pub mod favicon_candidates;
pub mod favicon_resolve;

pub use favicon_candidates::{FaviconCandidatesParams, candidates_impl};
pub use favicon_resolve::{FaviconResolveParams, resolve_impl};
