use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// The only configuration schema version this build understands.
pub const SUPPORTED_CONFIG_VERSION: u64 = 1;

/// Sentinel engine name that disables formatting for a language.
pub const NO_FORMATTER: &str = "none";

/// Engine used when a configuration does not name one.
pub const DEFAULT_FORMATTER: &str = "prettier";

/// Engine-specific option bag (`formatterOptions.<engine>`).
pub type OptionBag = serde_json::Map<String, serde_json::Value>;

/// Validated fencefmt configuration.
///
/// Build one through [`crate::config::ConfigReader`] or
/// [`crate::config::validate_config`]; both reject unsupported versions and
/// malformed shapes before anything is formatted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Schema version, must equal [`SUPPORTED_CONFIG_VERSION`]
    pub version: u64,

    /// Baseline lint rule bundle
    #[serde(default)]
    pub preset: Preset,

    /// Lint rule overrides applied on top of the preset
    #[serde(default)]
    pub rules: IndexMap<String, serde_json::Value>,

    /// Formatter routing
    #[serde(default)]
    pub formatters: FormattersConfig,

    /// Per-engine option bags, merged over each engine's defaults
    #[serde(default)]
    pub formatter_options: IndexMap<String, OptionBag>,

    /// Glob patterns excluded from linting and formatting
    #[serde(default)]
    pub ignores: Vec<String>,

    /// Terminology consistency entries
    #[serde(default)]
    pub terminology: Vec<TerminologyEntry>,

    /// Output toggles for consuming layers
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            preset: Preset::default(),
            rules: IndexMap::new(),
            formatters: FormattersConfig::default(),
            formatter_options: IndexMap::new(),
            ignores: Vec::new(),
            terminology: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Compile `ignores` into a matcher.
    pub fn ignore_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for (i, pattern) in self.ignores.iter().enumerate() {
            let glob = Glob::new(pattern).map_err(|e| Error::validation(format!("ignores[{i}]"), e.to_string()))?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| Error::validation("ignores", e.to_string()))
    }

    /// Whether `path` matches any of the `ignores` globs.
    ///
    /// Compiles the globs on every call; build [`ignore_set`](Self::ignore_set)
    /// once when checking many paths.
    pub fn is_ignored(&self, path: &Path) -> bool {
        match self.ignore_set() {
            Ok(set) => set.is_match(path),
            Err(e) => {
                log::warn!("[fencefmt-config] {e}");
                false
            }
        }
    }

    /// Options configured for `engine`, if any.
    pub fn options_for(&self, engine: &str) -> Option<&OptionBag> {
        self.formatter_options.get(engine)
    }
}

/// Named bundle of baseline lint rule settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Strict,
    #[default]
    Standard,
    Relaxed,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Strict, Preset::Standard, Preset::Relaxed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Standard => "standard",
            Self::Relaxed => "relaxed",
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown preset '{s}', expected one of: strict, standard, relaxed"))
    }
}

/// Which engine formats which language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct FormattersConfig {
    /// Engine used when no language-specific engine applies
    #[serde(default = "default_formatter")]
    pub default: String,

    /// Language -> engine name (or `"none"` to skip the language)
    #[serde(default)]
    pub languages: IndexMap<String, String>,
}

fn default_formatter() -> String {
    DEFAULT_FORMATTER.to_string()
}

impl Default for FormattersConfig {
    fn default() -> Self {
        Self {
            default: default_formatter(),
            languages: IndexMap::new(),
        }
    }
}

/// One preferred-term entry for the terminology lint rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminologyEntry {
    pub incorrect: String,
    pub correct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct OutputConfig {
    /// Report per-fragment warnings
    #[serde(default = "default_true")]
    pub diagnostics: bool,

    /// Log per-document progress
    #[serde(default)]
    pub progress: bool,

    /// Colorize terminal output
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            diagnostics: true,
            progress: false,
            color: true,
        }
    }
}

/// JSON schema of the configuration file.
pub fn config_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Config)).unwrap_or(serde_json::Value::Null)
}
