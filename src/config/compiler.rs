//! Expands a validated [`Config`] into per-engine configuration objects.
//!
//! The lint engine config is always produced. Formatter engine configs are
//! only produced for engines the configuration actually routes to.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use super::presets::preset_rules;
use super::rule_names::canonical_rule_key;
use super::types::{Config, NO_FORMATTER, OptionBag, SUPPORTED_CONFIG_VERSION};
use crate::error::{Error, Result};
use crate::formatters::BuiltinEngine;

/// Rule key the terminology settings are attached under.
pub const TERMINOLOGY_RULE: &str = "terminology";

/// Module path of the custom terminology rule, as the lint engine loads it.
pub const TERMINOLOGY_CUSTOM_RULE: &str = "fencefmt/terminology";

/// File the lint engine config is written to.
pub const LINT_CONFIG_FILE: &str = ".markdownlint-cli2.jsonc";

/// Output of [`ConfigCompiler::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedConfigs {
    /// markdownlint-cli2 shaped object: `config`, `customRules`, `ignores`.
    pub lint: Value,
    /// One entry per used, recognized formatter engine, in first-reference order.
    pub formatters: IndexMap<BuiltinEngine, Value>,
    /// Engine names that were referenced but not recognized.
    pub unknown_engines: Vec<String>,
}

/// A generated configuration file, ready to be persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub file_name: &'static str,
    pub contents: String,
}

impl GeneratedConfigs {
    /// Serialize every generated object to its conventional file name.
    pub fn files(&self) -> Result<Vec<GeneratedFile>> {
        let mut files = Vec::with_capacity(1 + self.formatters.len());
        files.push(GeneratedFile {
            file_name: LINT_CONFIG_FILE,
            contents: to_pretty_json(&self.lint)?,
        });
        for (engine, value) in &self.formatters {
            files.push(GeneratedFile {
                file_name: engine.config_file_name(),
                contents: to_pretty_json(value)?,
            });
        }
        Ok(files)
    }

    pub fn formatter(&self, engine: BuiltinEngine) -> Option<&Value> {
        self.formatters.get(&engine)
    }
}

fn to_pretty_json(value: &Value) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).map_err(|e| Error::Internal(e.to_string()))?;
    out.push('\n');
    Ok(out)
}

pub struct ConfigCompiler;

impl ConfigCompiler {
    pub fn compile(config: &Config) -> Result<GeneratedConfigs> {
        if config.version != SUPPORTED_CONFIG_VERSION {
            return Err(Error::validation(
                "version",
                format!(
                    "unsupported version {}, expected {SUPPORTED_CONFIG_VERSION}",
                    config.version
                ),
            ));
        }

        let lint = Self::lint_config(config);

        let (used, unknown_engines) = used_engines(config);
        for name in &unknown_engines {
            log::warn!("[fencefmt-config] Unknown formatter '{name}' referenced in config; no config generated for it");
        }

        let formatters = used
            .into_iter()
            .map(|engine| {
                let mut options = engine_defaults(engine);
                if let Some(overrides) = config.options_for(engine.name()) {
                    shallow_merge(&mut options, overrides);
                }
                (engine, Value::Object(options))
            })
            .collect();

        Ok(GeneratedConfigs {
            lint,
            formatters,
            unknown_engines,
        })
    }

    fn lint_config(config: &Config) -> Value {
        let mut rules: Map<String, Value> = preset_rules(config.preset).into_iter().collect();
        for (key, value) in &config.rules {
            rules.insert(canonical_rule_key(key), value.clone());
        }

        let mut lint = Map::new();
        let mut custom_rules = Vec::new();
        if !config.terminology.is_empty() {
            let terms: Vec<Value> = config
                .terminology
                .iter()
                .map(|entry| {
                    json!({
                        "incorrect": entry.incorrect,
                        "correct": entry.correct,
                        "caseSensitive": entry.case_sensitive.unwrap_or(false),
                    })
                })
                .collect();
            rules.insert(TERMINOLOGY_RULE.to_string(), json!({ "terms": terms }));
            custom_rules.push(Value::String(TERMINOLOGY_CUSTOM_RULE.to_string()));
        }

        lint.insert("config".to_string(), Value::Object(rules));
        if !custom_rules.is_empty() {
            lint.insert("customRules".to_string(), Value::Array(custom_rules));
        }
        lint.insert(
            "ignores".to_string(),
            Value::Array(config.ignores.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(lint)
    }
}

/// Split the engines referenced by `formatters.default` and `formatters.languages`
/// into recognized engines and unknown names. Both lists are deduplicated and
/// keep first-reference order; the `none` sentinel is neither.
pub fn used_engines(config: &Config) -> (Vec<BuiltinEngine>, Vec<String>) {
    let referenced = std::iter::once(&config.formatters.default).chain(config.formatters.languages.values());

    let mut known = Vec::new();
    let mut unknown: Vec<String> = Vec::new();
    for name in referenced {
        if name == NO_FORMATTER {
            continue;
        }
        match BuiltinEngine::from_name(name) {
            Some(engine) if !known.contains(&engine) => known.push(engine),
            Some(_) => {}
            None if !unknown.contains(name) => unknown.push(name.clone()),
            None => {}
        }
    }
    (known, unknown)
}

/// Default option bag written for `engine`.
pub fn engine_defaults(engine: BuiltinEngine) -> OptionBag {
    let value = match engine {
        BuiltinEngine::Prettier => json!({
            "printWidth": 80,
            "tabWidth": 2,
            "useTabs": false,
            "semi": true,
            "singleQuote": false,
            "trailingComma": "all",
            "proseWrap": "preserve",
        }),
        BuiltinEngine::Biome => json!({
            "$schema": "https://biomejs.dev/schemas/1.9.4/schema.json",
            "formatter": {
                "enabled": true,
                "indentStyle": "space",
                "indentWidth": 2,
                "lineWidth": 80,
            },
            "javascript": {
                "formatter": {
                    "quoteStyle": "double",
                    "semicolons": "always",
                },
            },
        }),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn shallow_merge(base: &mut OptionBag, overrides: &OptionBag) {
    for (key, value) in overrides {
        base.insert(key.clone(), value.clone());
    }
}
