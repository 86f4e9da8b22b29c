//! Adapter for biome, the fast engine for the JavaScript family, JSON, CSS
//! and GraphQL.

use serde_json::Value;
use std::path::PathBuf;

use super::adapter::{FormatOptions, FormatOutcome, FormatterAdapter};
use super::engine::ExternalEngine;
use super::languages::stub_file_name;
use super::registry::EngineSettings;
use super::{BuiltinEngine, kebab_case};
use crate::error::{Error, Result};

pub const BIOME_LANGUAGES: &[&str] = &["javascript", "typescript", "jsx", "tsx", "json", "css", "graphql"];

/// Leaf option names biome accepts as `--name=value` on `biome format`.
const FLAGS: &[&str] = &[
    "indentStyle",
    "indentWidth",
    "lineWidth",
    "lineEnding",
    "quoteStyle",
    "jsxQuoteStyle",
    "quoteProperties",
    "semicolons",
    "trailingCommas",
    "arrowParentheses",
    "bracketSpacing",
    "bracketSameLine",
];

#[derive(Debug)]
pub struct BiomeAdapter {
    engine: ExternalEngine,
}

impl BiomeAdapter {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            engine: ExternalEngine::new(
                BuiltinEngine::Biome.name(),
                BuiltinEngine::Biome.binary(),
                settings.timeout_ms,
                settings.working_dir.clone(),
            ),
        }
    }

    /// Use a specific biome executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.engine.set_program(program.into());
        self
    }
}

/// Command-line arguments for one `biome format` call.
///
/// The option bag is shaped like `biome.json`; nested sections are flattened
/// and later (more specific) sections override earlier ones.
pub fn biome_args(stub: &str, options: Option<&FormatOptions>) -> Vec<String> {
    let mut args = vec!["format".to_string(), format!("--stdin-file-path={stub}")];
    let Some(options) = options else {
        return args;
    };

    let mut leaves: Vec<(&str, &Value)> = Vec::new();
    collect_leaves(options, &mut leaves);

    for flag in FLAGS {
        let Some((_, value)) = leaves.iter().rev().find(|(key, _)| key == flag) else {
            continue;
        };
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                log::debug!("[fencefmt-biome] Ignoring option {flag}={other}");
                continue;
            }
        };
        args.push(format!("--{}={rendered}", kebab_case(flag)));
    }
    args
}

fn collect_leaves<'a>(map: &'a FormatOptions, out: &mut Vec<(&'a str, &'a Value)>) {
    for (key, value) in map {
        match value {
            Value::Object(nested) => collect_leaves(nested, out),
            _ => out.push((key.as_str(), value)),
        }
    }
}

impl FormatterAdapter for BiomeAdapter {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    fn version(&self) -> Result<String> {
        self.engine.version()
    }

    fn format(&self, code: &str, language: &str, options: Option<&FormatOptions>) -> Result<FormatOutcome> {
        let stub = stub_file_name(language)
            .filter(|_| self.supports(language))
            .ok_or_else(|| Error::FormatterFailed {
                engine: self.engine.name().to_string(),
                diagnostic: format!("language '{language}' is not supported"),
            })?;
        let output = self.engine.run_format(&biome_args(&stub, options), code)?;
        Ok(FormatOutcome::from_engine_output(code, &output))
    }

    fn supported_languages(&self) -> Vec<String> {
        BIOME_LANGUAGES.iter().map(|l| l.to_string()).collect()
    }

    fn dispose(&self) {
        self.engine.dispose();
    }
}
