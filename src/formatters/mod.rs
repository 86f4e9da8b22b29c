//! External formatting engines and the adapters that wrap them.
//!
//! Every engine is consumed through the [`FormatterAdapter`] trait. The
//! built-in adapters drive engines as subprocesses over stdin/stdout:
//!
//! - `prettier`: general purpose (JavaScript family, JSON, CSS, HTML, YAML,
//!   Markdown, GraphQL, ...)
//! - `biome`: fast, narrower (JavaScript family, JSON, CSS, GraphQL)
//!
//! Engines are located lazily on first use, in `node_modules/.bin` above the
//! working directory and then on `PATH`, and the acquired handle is reused
//! until the adapter is disposed.

pub mod adapter;
pub mod biome;
pub mod engine;
pub mod executor;
pub mod languages;
pub mod prettier;
pub mod registry;

pub use adapter::{FormatOptions, FormatOutcome, FormatterAdapter};
pub use biome::BiomeAdapter;
pub use engine::{EngineHandle, EngineSlot};
pub use languages::LanguageResolver;
pub use prettier::PrettierAdapter;
pub use registry::{EngineSettings, EngineStatus, FormatterRegistry};

/// Engines fencefmt knows how to drive and generate configuration for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinEngine {
    Prettier,
    Biome,
}

impl BuiltinEngine {
    pub const ALL: [BuiltinEngine; 2] = [BuiltinEngine::Prettier, BuiltinEngine::Biome];

    /// Name used in configuration and the registry.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prettier => "prettier",
            Self::Biome => "biome",
        }
    }

    /// Executable name.
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Prettier => "prettier",
            Self::Biome => "biome",
        }
    }

    /// File the engine reads its generated configuration from.
    pub fn config_file_name(&self) -> &'static str {
        match self {
            Self::Prettier => ".prettierrc.json",
            Self::Biome => "biome.json",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }
}

impl std::fmt::Display for BuiltinEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `printWidth` -> `print-width`
pub(crate) fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
