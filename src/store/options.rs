use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`PersistenceContext`](super::PersistenceContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Pre-sizes the ledger maps.
    pub initial_capacity: usize,
    /// When false, `get_or_create_entity_proxy` only resolves tracked entities.
    pub lazy_proxies: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            initial_capacity: 64,
            lazy_proxies: true,
        }
    }
}

impl ContextOptions {
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn lazy_proxies(mut self, lazy_proxies: bool) -> Self {
        self.lazy_proxies = lazy_proxies;
        self
    }
}
