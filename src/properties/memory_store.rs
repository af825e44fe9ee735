use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::PropertyStore;

/// In-process property map. Used when no property file is supplied and by tests.
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given pairs
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values: Mutex::new(map) }
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow!("Property map lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
