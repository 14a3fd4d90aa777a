//! Persistent favicon resolution cache.
//!
//! Maps a normalized domain to the last known resolution outcome. The whole
//! map lives in a single key/value slot as one JSON blob:
//!
//! - Entries expire lazily on read, with a long TTL for successes and a short
//!   one for failures
//! - Capacity is enforced after every write by dropping the oldest entries
//! - Storage is pluggable: in-memory or SQLite (WAL mode, versioned migrations)

pub mod backend;
pub mod clock;
pub mod connection;
pub mod entry;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use backend::{KeyValueStore, MemoryStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::SqliteStore;
pub use entry::{CacheEntry, CachePolicy, EXHAUSTED_LABEL};
pub use store::FaviconCache;

/// Version segment of the storage key; bump on any change to the entry layout.
pub const SCHEMA_VERSION: u32 = 1;
