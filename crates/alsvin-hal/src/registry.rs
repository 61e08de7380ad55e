//! Provider registry.
//!
//! The set of providers is closed: each adapter crate registers a factory
//! under its provider id at startup, and configuration selects which ones
//! to instantiate. No name-based reflection is involved.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{HalError, HalResult};
use crate::provider::Provider;

/// Factory function producing a provider from configuration.
type ProviderFactory = Box<dyn Fn(ProviderConfig) -> HalResult<Arc<dyn Provider>> + Send + Sync>;

/// Central registry for provider adapters.
pub struct ProviderRegistry {
    factories: FxHashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Register a provider factory under an id.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn(ProviderConfig) -> HalResult<Arc<dyn Provider>> + Send + Sync + 'static,
    ) {
        let id = id.into();
        debug!("Registering provider factory: {}", id);
        self.factories.insert(id, Box::new(factory));
    }

    /// Create a provider by id.
    pub fn create(&self, id: &str, config: ProviderConfig) -> HalResult<Arc<dyn Provider>> {
        let factory = self.factories.get(id).ok_or_else(|| {
            HalError::ProviderUnavailable(format!("no provider registered with id '{id}'"))
        })?;
        factory(config)
    }

    /// List all registered provider ids, sorted.
    pub fn available_providers(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Check whether a provider id is registered.
    pub fn has_provider(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.available_providers().is_empty());
        assert!(!registry.has_provider("ionq"));
        assert!(registry
            .create("ionq", ProviderConfig::new("ionq"))
            .is_err());
    }

    #[test]
    fn test_register_and_list() {
        let mut registry = ProviderRegistry::new();
        registry.register("zeta", |_| {
            Err(HalError::ProviderUnavailable("test only".into()))
        });
        registry.register("alpha", |_| {
            Err(HalError::ProviderUnavailable("test only".into()))
        });

        assert!(registry.has_provider("zeta"));
        assert_eq!(registry.available_providers(), vec!["alpha", "zeta"]);
    }
}
