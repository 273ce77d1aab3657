//! Static backend registry
//!
//! Maps a provider name from configuration to a statically-typed backend
//! adapter, resolved at startup. Unknown provider names are configuration
//! errors, never a dynamic lookup failure.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::MetricsBackend;
use crate::backends::{ElasticsearchBackend, MemoryBackend, PrometheusBackend};
use crate::error::{ConfigError, Result};

/// Registry of available backend adapters, keyed by provider name
pub struct BackendRegistry {
    backends: HashMap<&'static str, Arc<dyn MetricsBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Create a registry with all built-in adapters wired
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PrometheusBackend::new()));
        registry.register(Arc::new(ElasticsearchBackend::new()));
        registry.register(Arc::new(MemoryBackend::new()));
        registry
    }

    /// Register an adapter under its own name
    pub fn register(&mut self, backend: Arc<dyn MetricsBackend>) {
        self.backends.insert(backend.name(), backend);
    }

    /// Resolve a provider name from configuration
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn MetricsBackend>> {
        self.backends.get(name).cloned().ok_or_else(|| {
            ConfigError::UnknownBackend {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Provider names available in this registry, sorted
    pub fn providers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.backends.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_default_registry_providers() {
        let registry = BackendRegistry::with_defaults();
        assert_eq!(
            registry.providers(),
            vec!["elasticsearch", "memory", "prometheus"]
        );
    }

    #[test]
    fn test_resolve_known_backend() {
        let registry = BackendRegistry::with_defaults();
        let backend = registry.resolve("memory").unwrap();
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn test_resolve_unknown_backend() {
        let registry = BackendRegistry::with_defaults();
        let err = registry.resolve("stackdriver").err().unwrap();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::UnknownBackend { ref name }) if name == "stackdriver"
        ));
    }
}
