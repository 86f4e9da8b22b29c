//! Adapter for prettier, the general-purpose multi-language engine.

use serde_json::Value;
use std::path::PathBuf;

use super::adapter::{FormatOptions, FormatOutcome, FormatterAdapter};
use super::engine::ExternalEngine;
use super::languages::stub_file_name;
use super::registry::EngineSettings;
use super::{BuiltinEngine, kebab_case};
use crate::error::{Error, Result};

pub const PRETTIER_LANGUAGES: &[&str] = &[
    "javascript",
    "typescript",
    "jsx",
    "tsx",
    "json",
    "css",
    "scss",
    "less",
    "html",
    "vue",
    "yaml",
    "markdown",
    "graphql",
    "handlebars",
];

#[derive(Debug, Clone, Copy)]
enum Flag {
    /// Boolean switch; `default_on` switches are only emitted as `--no-*`.
    Switch { default_on: bool },
    /// `--name=value`
    Value,
}

/// Option-bag keys prettier accepts on its command line.
const FLAGS: &[(&str, Flag)] = &[
    ("printWidth", Flag::Value),
    ("tabWidth", Flag::Value),
    ("useTabs", Flag::Switch { default_on: false }),
    ("semi", Flag::Switch { default_on: true }),
    ("singleQuote", Flag::Switch { default_on: false }),
    ("jsxSingleQuote", Flag::Switch { default_on: false }),
    ("quoteProps", Flag::Value),
    ("trailingComma", Flag::Value),
    ("bracketSpacing", Flag::Switch { default_on: true }),
    ("bracketSameLine", Flag::Switch { default_on: false }),
    ("arrowParens", Flag::Value),
    ("proseWrap", Flag::Value),
    ("endOfLine", Flag::Value),
    ("htmlWhitespaceSensitivity", Flag::Value),
    ("singleAttributePerLine", Flag::Switch { default_on: false }),
];

#[derive(Debug)]
pub struct PrettierAdapter {
    engine: ExternalEngine,
}

impl PrettierAdapter {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            engine: ExternalEngine::new(
                BuiltinEngine::Prettier.name(),
                BuiltinEngine::Prettier.binary(),
                settings.timeout_ms,
                settings.working_dir.clone(),
            ),
        }
    }

    /// Use a specific prettier executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.engine.set_program(program.into());
        self
    }
}

/// Command-line arguments for one prettier call.
pub fn prettier_args(stub: &str, options: Option<&FormatOptions>) -> Vec<String> {
    let mut args = vec!["--stdin-filepath".to_string(), stub.to_string()];
    let Some(options) = options else {
        return args;
    };

    for (key, flag) in FLAGS {
        let Some(value) = options.get(*key) else {
            continue;
        };
        let name = kebab_case(key);
        match (flag, value) {
            (Flag::Switch { default_on: false }, Value::Bool(true)) => args.push(format!("--{name}")),
            (Flag::Switch { default_on: true }, Value::Bool(false)) => args.push(format!("--no-{name}")),
            (Flag::Switch { .. }, Value::Bool(_)) => {}
            (Flag::Value, Value::String(s)) => args.push(format!("--{name}={s}")),
            (Flag::Value, Value::Number(n)) => args.push(format!("--{name}={n}")),
            (_, other) => log::debug!("[fencefmt-prettier] Ignoring option {key}={other}"),
        }
    }
    args
}

impl FormatterAdapter for PrettierAdapter {
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
        let output = self.engine.run_format(&prettier_args(&stub, options), code)?;
        Ok(FormatOutcome::from_engine_output(code, &output))
    }

    fn supported_languages(&self) -> Vec<String> {
        PRETTIER_LANGUAGES.iter().map(|l| l.to_string()).collect()
    }

    fn dispose(&self) {
        self.engine.dispose();
    }
}
