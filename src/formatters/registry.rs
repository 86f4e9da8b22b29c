//! Name -> adapter registry injected into the orchestrator.
//!
//! The orchestrator never names a concrete engine; it asks the registry for
//! whatever is registered under a configured name and checks availability.

use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::BuiltinEngine;
use super::adapter::FormatterAdapter;
use super::biome::BiomeAdapter;
use super::executor::DEFAULT_TIMEOUT_MS;
use super::prettier::PrettierAdapter;

/// Settings shared by the built-in subprocess adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Per-call timeout in milliseconds (0 waits indefinitely)
    pub timeout_ms: u64,
    /// Directory engines run in and `node_modules/.bin` is searched from
    pub working_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            working_dir: None,
        }
    }
}

/// Availability report for one registered adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
}

#[derive(Clone, Default)]
pub struct FormatterRegistry {
    adapters: IndexMap<String, Arc<dyn FormatterAdapter>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in engine adapter.
    pub fn with_builtin_engines(settings: &EngineSettings) -> Self {
        let mut registry = Self::new();
        for engine in BuiltinEngine::ALL {
            let adapter: Arc<dyn FormatterAdapter> = match engine {
                BuiltinEngine::Prettier => Arc::new(PrettierAdapter::new(settings)),
                BuiltinEngine::Biome => Arc::new(BiomeAdapter::new(settings)),
            };
            registry.register(adapter);
        }
        registry
    }

    /// Register `adapter` under its own name, returning any adapter it replaced.
    pub fn register(&mut self, adapter: Arc<dyn FormatterAdapter>) -> Option<Arc<dyn FormatterAdapter>> {
        let name = adapter.name().to_string();
        self.adapters.insert(name, adapter)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FormatterAdapter>> {
        self.adapters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The adapter registered as `name`, if it is also available.
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn FormatterAdapter>> {
        self.adapters.get(name).filter(|adapter| adapter.is_available())
    }

    /// Probe every registered adapter.
    pub fn probe(&self) -> Vec<EngineStatus> {
        self.adapters
            .iter()
            .map(|(name, adapter)| {
                let available = adapter.is_available();
                EngineStatus {
                    name: name.clone(),
                    available,
                    version: if available { adapter.version().ok() } else { None },
                }
            })
            .collect()
    }

    pub fn dispose_all(&self) {
        for adapter in self.adapters.values() {
            adapter.dispose();
        }
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
