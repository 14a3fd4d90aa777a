//! Client code for favicache.
//!
//! This crate provides the network side of icon resolution: an HTTP icon
//! loader with SSRF protection, and the probe loop that feeds load outcomes
//! back into the resolver. Shared by the server and CLI.

pub mod fetch;
pub mod probe;

pub use fetch::{HttpIconLoader, IconLoader, LoadConfig, LoadError, LoadedIcon};
pub use probe::{ProbeOptions, ResolveOutcome, resolve_link};
