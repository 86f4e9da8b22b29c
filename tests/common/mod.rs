#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fencefmt::config::{Config, FormattersConfig};
use fencefmt::formatters::FormatOptions;
use fencefmt::{Error, FormatOutcome, FormatterAdapter, FormatterRegistry, Result};

/// In-process engine: spaces around `=`, one `;` per statement line.
/// Code containing `!!` is rejected like a syntax error, and code containing
/// `loop {}` behaves like an engine that hangs past its timeout.
pub struct StatementEngine {
    name: &'static str,
    languages: Vec<String>,
    pub calls: AtomicUsize,
}

impl StatementEngine {
    pub fn new(name: &'static str, languages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            languages: languages.iter().map(|l| l.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormatterAdapter for StatementEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn version(&self) -> Result<String> {
        Ok("1.0.0".to_string())
    }

    fn format(&self, code: &str, _language: &str, _options: Option<&FormatOptions>) -> Result<FormatOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if code.contains("!!") {
            return Err(Error::FormatterFailed {
                engine: self.name.to_string(),
                diagnostic: "[error] Unexpected token".to_string(),
            });
        }
        if code.contains("loop {}") {
            return Err(Error::FormatterTimeout {
                engine: self.name.to_string(),
                timeout_ms: 100,
            });
        }
        let mut out = String::new();
        for line in code.lines() {
            let line = line.trim();
            if line.is_empty() {
                out.push('\n');
                continue;
            }
            let spaced = line.split('=').map(str::trim).collect::<Vec<_>>().join(" = ");
            out.push_str(spaced.trim_end_matches(';'));
            out.push_str(";\n");
        }
        Ok(FormatOutcome::from_engine_output(code, &out))
    }

    fn supported_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}

pub fn registry_with(engines: &[Arc<StatementEngine>]) -> FormatterRegistry {
    let mut registry = FormatterRegistry::new();
    for engine in engines {
        registry.register(engine.clone());
    }
    registry
}

pub fn config_with_default(default: &str) -> Config {
    Config {
        formatters: FormattersConfig {
            default: default.to_string(),
            ..FormattersConfig::default()
        },
        ..Config::default()
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}
