use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use super::Relay;

/// An in-process relay, standing in for the browser cookie jar.
#[derive(Default)]
pub struct MemoryRelay {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Relay for MemoryRelay {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        debug!("Relay entry '{}' set", name);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.remove(name).is_some() {
            debug!("Relay entry '{}' removed", name);
        }
    }
}
