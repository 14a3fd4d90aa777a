//! Durable key/value slots backing the cache.

use std::collections::HashMap;

use crate::Error;

/// A string-keyed store of string values.
///
/// The cache uses exactly one key and rewrites its whole value on every write.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, Error>;

    /// Replace the value stored under `key`.
    fn save(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

/// Process-local store; contents vanish with the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one slot, for loading fixtures.
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.into(), value.into());
        Self { slots }
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
