//! Formats every routable code fragment of a Markdown document.
//!
//! Each fragment goes `Discovered -> Routed -> {Formatted | Skipped | Failed}`.
//! Fragments are independent, so with the `parallel` feature they are
//! formatted on the rayon pool; their results land in a per-index map and
//! the document is reassembled once, serially, after all of them settle.
//!
//! A failing fragment never aborts the document: its original text is kept
//! and a [`FragmentWarning`] is recorded. Only structural problems (an
//! unreadable or unparseable source, a reassembly failure) fail the run.

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{Config, NO_FORMATTER};
use crate::document::{CodeFragment, DocumentProcessor, Replacements};
use crate::error::{Error, ErrorKind, Result};
use crate::formatters::{EngineSettings, FormatterAdapter, FormatterRegistry, LanguageResolver};

/// Counters for one `format` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Every extracted fragment, whatever happened to it
    pub fragments_processed: usize,
    /// Fragments whose text was replaced
    pub fragments_formatted: usize,
    pub fragments_skipped: usize,
    pub fragments_failed: usize,
    pub duration_ms: u64,
}

/// A fragment that failed and was left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentWarning {
    pub index: usize,
    /// Line of the opening fence
    pub line: usize,
    pub engine: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FragmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: code block {} not formatted by {}: {}",
            self.line, self.index, self.engine, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub content: String,
    pub stats: RunStats,
    pub warnings: Vec<FragmentWarning>,
}

impl FormatReport {
    pub fn changed(&self) -> bool {
        self.stats.fragments_formatted > 0
    }
}

/// Terminal state of one fragment.
#[derive(Debug)]
enum FragmentOutcome {
    Formatted(String),
    Unchanged,
    Skipped,
    Failed(FragmentWarning),
}

pub struct Orchestrator {
    config: Config,
    registry: FormatterRegistry,
    resolver: LanguageResolver,
    processor: DocumentProcessor,
    /// `formatters.languages` with canonical language keys
    language_engines: IndexMap<String, String>,
}

impl Orchestrator {
    pub fn new(config: Config, registry: FormatterRegistry) -> Self {
        let resolver = LanguageResolver::new();
        let language_engines = config
            .formatters
            .languages
            .iter()
            .map(|(language, engine)| (resolver.resolve(language), engine.clone()))
            .collect();

        for name in config
            .formatters
            .languages
            .values()
            .chain(std::iter::once(&config.formatters.default))
        {
            if name != NO_FORMATTER && !registry.contains(name) {
                log::warn!("[fencefmt-fmt] No formatter registered as '{name}'");
            }
        }

        Self {
            config,
            registry,
            resolver,
            processor: DocumentProcessor::new(),
            language_engines,
        }
    }

    /// Orchestrator over the built-in engines with default settings.
    pub fn with_builtin_engines(config: Config) -> Self {
        Self::with_engine_settings(config, &EngineSettings::default())
    }

    /// Orchestrator over the built-in engines with the given timeout and working directory.
    pub fn with_engine_settings(config: Config, settings: &EngineSettings) -> Self {
        Self::new(config, FormatterRegistry::with_builtin_engines(settings))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Engine that would format code tagged `language`, if any.
    pub fn engine_for(&self, language: &str) -> Option<&str> {
        self.route(language).map(|adapter| adapter.name())
    }

    fn route(&self, language: &str) -> Option<&Arc<dyn FormatterAdapter>> {
        let canonical = self.resolver.resolve(language);
        let usable = |name: &str| {
            if name == NO_FORMATTER {
                return None;
            }
            self.registry
                .resolve(name)
                .filter(|adapter| adapter.supports(&canonical))
        };

        match self.language_engines.get(&canonical) {
            Some(engine) if engine == NO_FORMATTER => None,
            Some(engine) => usable(engine).or_else(|| {
                log::debug!("[fencefmt-fmt] '{engine}' cannot format {canonical}, trying the default formatter");
                usable(&self.config.formatters.default)
            }),
            None => usable(&self.config.formatters.default),
        }
    }

    fn format_fragment(&self, fragment: &CodeFragment) -> FragmentOutcome {
        let Some(language) = fragment.language.as_deref() else {
            return FragmentOutcome::Skipped;
        };
        let Some(adapter) = self.route(language) else {
            log::debug!("[fencefmt-fmt] Skipping code block {} ({language})", fragment.index);
            return FragmentOutcome::Skipped;
        };

        let canonical = self.resolver.resolve(language);
        log::debug!(
            "[fencefmt-fmt] Formatting code block {} ({canonical}) with {}",
            fragment.index,
            adapter.name()
        );

        let failed = |kind: ErrorKind, message: String| {
            FragmentOutcome::Failed(FragmentWarning {
                index: fragment.index,
                line: fragment.position.start.line,
                engine: adapter.name().to_string(),
                kind,
                message,
            })
        };

        match adapter.format(&fragment.value, &canonical, self.config.options_for(adapter.name())) {
            Ok(outcome) if !outcome.did_change => FragmentOutcome::Unchanged,
            Ok(outcome) if !fragment.can_hold(&outcome.formatted) => failed(
                ErrorKind::FormatterFailed,
                "formatted code contains a line that would close the code fence".to_string(),
            ),
            Ok(outcome) => FragmentOutcome::Formatted(outcome.formatted),
            Err(e) => failed(e.kind(), e.to_string()),
        }
    }

    fn format_fragments(&self, fragments: &[CodeFragment]) -> Vec<FragmentOutcome> {
        #[cfg(feature = "parallel")]
        let outcomes = fragments.par_iter().map(|f| self.format_fragment(f)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes = fragments.iter().map(|f| self.format_fragment(f)).collect();
        outcomes
    }

    /// Format the code blocks of `document`.
    pub fn format(&self, document: &str) -> Result<FormatReport> {
        let started = Instant::now();
        let fragments = self.processor.extract(document)?;
        let outcomes = self.format_fragments(&fragments);

        let mut stats = RunStats {
            fragments_processed: fragments.len(),
            ..RunStats::default()
        };
        let mut replacements = Replacements::new();
        let mut warnings = Vec::new();

        for (fragment, outcome) in fragments.iter().zip(outcomes) {
            match outcome {
                FragmentOutcome::Formatted(text) => {
                    stats.fragments_formatted += 1;
                    replacements.insert(fragment.index, text);
                }
                FragmentOutcome::Unchanged => {}
                FragmentOutcome::Skipped => stats.fragments_skipped += 1,
                FragmentOutcome::Failed(warning) => {
                    stats.fragments_failed += 1;
                    if self.config.output.diagnostics {
                        log::warn!("[fencefmt-fmt] {warning}");
                    } else {
                        log::debug!("[fencefmt-fmt] {warning}");
                    }
                    warnings.push(warning);
                }
            }
        }

        let content = self.processor.reassemble(document, &replacements)?;
        stats.duration_ms = started.elapsed().as_millis() as u64;

        if self.config.output.progress {
            log::info!(
                "[fencefmt-fmt] {} code blocks, {} formatted, {} skipped, {} failed in {}ms",
                stats.fragments_processed,
                stats.fragments_formatted,
                stats.fragments_skipped,
                stats.fragments_failed,
                stats.duration_ms
            );
        }

        Ok(FormatReport {
            content,
            stats,
            warnings,
        })
    }

    /// Read `path` and format it. The file is not written.
    pub fn format_file(&self, path: impl AsRef<Path>) -> Result<FormatReport> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::from_io(path, e))?;
        let document = String::from_utf8(bytes).map_err(|e| Error::parse(path.display().to_string(), e))?;
        self.format(&document)
    }

    /// Release every acquired engine.
    pub fn dispose(&self) {
        self.registry.dispose_all();
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("language_engines", &self.language_engines)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormattersConfig;
    use crate::formatters::{FormatOptions, FormatOutcome};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adds spaces around `=` and a trailing `;` to every non-empty line.
    struct SpacingAdapter {
        name: &'static str,
        languages: &'static [&'static str],
        available: bool,
        calls: AtomicUsize,
        disposed: AtomicUsize,
    }

    impl SpacingAdapter {
        fn new(name: &'static str, languages: &'static [&'static str]) -> Self {
            Self {
                name,
                languages,
                available: true,
                calls: AtomicUsize::new(0),
                disposed: AtomicUsize::new(0),
            }
        }

        fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }
    }

    impl FormatterAdapter for SpacingAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn version(&self) -> Result<String> {
            Ok("0.0.1".to_string())
        }

        fn format(&self, code: &str, _language: &str, _options: Option<&FormatOptions>) -> Result<FormatOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if code.contains("syntax error") {
                return Err(Error::FormatterFailed {
                    engine: self.name.to_string(),
                    diagnostic: "SyntaxError: Unexpected token (1:8)".to_string(),
                });
            }
            if code.contains("while(true)") {
                return Err(Error::FormatterTimeout {
                    engine: self.name.to_string(),
                    timeout_ms: 250,
                });
            }
            let mut out = String::new();
            for line in code.lines() {
                if line.trim().is_empty() {
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
            self.languages.iter().map(|l| l.to_string()).collect()
        }

        fn dispose(&self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config_with(default: &str, languages: &[(&str, &str)]) -> Config {
        Config {
            formatters: FormattersConfig {
                default: default.to_string(),
                languages: languages
                    .iter()
                    .map(|(l, e)| (l.to_string(), e.to_string()))
                    .collect(),
            },
            ..Config::default()
        }
    }

    fn registry_of(adapters: Vec<Arc<SpacingAdapter>>) -> FormatterRegistry {
        let mut registry = FormatterRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        registry
    }

    const JS_FAMILY: &[&str] = &["javascript", "typescript", "json"];

    #[test]
    fn test_end_to_end_example() {
        let orchestrator = Orchestrator::new(
            config_with("spacing", &[]),
            registry_of(vec![Arc::new(SpacingAdapter::new("spacing", JS_FAMILY))]),
        );
        let report = orchestrator.format("# T\n\n```js\nconst x=1\n```\n").unwrap();
        assert!(report.content.contains("const x = 1;"));
        assert_eq!(report.content, "# T\n\n```js\nconst x = 1;\n```\n");
        assert_eq!(report.stats.fragments_processed, 1);
        assert_eq!(report.stats.fragments_formatted, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let orchestrator = Orchestrator::new(
            config_with("spacing", &[]),
            registry_of(vec![Arc::new(SpacingAdapter::new("spacing", JS_FAMILY))]),
        );
        let first = orchestrator.format("```js\nlet a=1\nlet b=2\n```\n").unwrap();
        let second = orchestrator.format(&first.content).unwrap();
        assert_eq!(second.content, first.content);
        assert_eq!(second.stats.fragments_formatted, 0);
        assert!(!second.changed());
    }

    #[test]
    fn test_failed_fragment_is_isolated() {
        let orchestrator = Orchestrator::new(
            config_with("spacing", &[]),
            registry_of(vec![Arc::new(SpacingAdapter::new("spacing", JS_FAMILY))]),
        );
        let doc = "```js\nsyntax error=\n```\n\n```js\nconst y=2\n```\n";
        let report = orchestrator.format(doc).unwrap();

        assert_eq!(report.stats.fragments_processed, 2);
        assert_eq!(report.stats.fragments_formatted, 1);
        assert_eq!(report.stats.fragments_failed, 1);
        assert_eq!(report.content, "```js\nsyntax error=\n```\n\n```js\nconst y = 2;\n```\n");

        let warning = &report.warnings[0];
        assert_eq!(warning.index, 0);
        assert_eq!(warning.line, 1);
        assert_eq!(warning.engine, "spacing");
        assert_eq!(warning.kind, ErrorKind::FormatterFailed);
        assert!(warning.message.contains("SyntaxError: Unexpected token (1:8)"));
    }

    #[test]
    fn test_timeout_is_isolated_to_its_fragment() {
        let orchestrator = Orchestrator::new(
            config_with("spacing", &[]),
            registry_of(vec![Arc::new(SpacingAdapter::new("spacing", JS_FAMILY))]),
        );
        let doc = "```js
const a=1
```

```js
while(true) {}
```

```js
const b=2
```
";
        let report = orchestrator.format(doc).unwrap();

        assert_eq!(
            report.content,
            "```js
const a = 1;
```

```js
while(true) {}
```

```js
const b = 2;
```
"
        );
        assert_eq!(report.stats.fragments_processed, 3);
        assert_eq!(report.stats.fragments_formatted, 2);
        assert_eq!(report.stats.fragments_failed, 1);

        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings[0];
        assert_eq!(warning.index, 1);
        assert_eq!(warning.line, 5);
        assert_eq!(warning.kind, ErrorKind::FormatterTimeout);
        assert!(warning.message.contains("timed out after 250ms"));
    }

    #[test]
    fn test_language_override_takes_precedence() {
        let fast = Arc::new(SpacingAdapter::new("fast", &["typescript"]));
        let general = Arc::new(SpacingAdapter::new("general", JS_FAMILY));
        let orchestrator = Orchestrator::new(
            config_with("general", &[("ts", "fast")]),
            registry_of(vec![fast.clone(), general.clone()]),
        );

        assert_eq!(orchestrator.engine_for("typescript"), Some("fast"));
        assert_eq!(orchestrator.engine_for("ts"), Some("fast"));
        assert_eq!(orchestrator.engine_for("js"), Some("general"));

        orchestrator.format("```typescript\nlet a=1\n```\n").unwrap();
        assert_eq!(fast.calls.load(Ordering::SeqCst), 1);
        assert_eq!(general.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unavailable_override_degrades_to_default() {
        let orchestrator = Orchestrator::new(
            config_with("general", &[("javascript", "fast"), ("json", "missing")]),
            registry_of(vec![
                Arc::new(SpacingAdapter::new("fast", JS_FAMILY).unavailable()),
                Arc::new(SpacingAdapter::new("general", JS_FAMILY)),
            ]),
        );
        assert_eq!(orchestrator.engine_for("javascript"), Some("general"));
        assert_eq!(orchestrator.engine_for("json"), Some("general"));
    }

    #[test]
    fn test_none_sentinel_and_unroutable_fragments_are_skipped() {
        let general = Arc::new(SpacingAdapter::new("general", JS_FAMILY));
        let orchestrator = Orchestrator::new(
            config_with("general", &[("javascript", "none")]),
            registry_of(vec![general.clone()]),
        );
        let doc = "```js\nlet a=1\n```\n\n```python\nx=1\n```\n\n```\nno language\n```\n";
        let report = orchestrator.format(doc).unwrap();

        assert_eq!(report.content, doc);
        assert_eq!(report.stats.fragments_processed, 3);
        assert_eq!(report.stats.fragments_skipped, 3);
        assert_eq!(general.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_default_engine_skips_everything() {
        let orchestrator = Orchestrator::new(
            config_with("none", &[]),
            registry_of(vec![Arc::new(SpacingAdapter::new("general", JS_FAMILY))]),
        );
        assert_eq!(orchestrator.engine_for("javascript"), None);
    }

    #[test]
    fn test_excluded_blocks_are_not_counted() {
        let orchestrator = Orchestrator::new(
            config_with("spacing", &[]),
            registry_of(vec![Arc::new(SpacingAdapter::new("spacing", JS_FAMILY))]),
        );
        let doc = "    let indented=1\n\n> ```js\n> let quoted=1\n> ```\n\n```js\nlet a=1\n```\n";
        let report = orchestrator.format(doc).unwrap();
        assert_eq!(report.stats.fragments_processed, 1);
        assert_eq!(report.stats.fragments_formatted, 1);
        assert!(report.content.starts_with("    let indented=1\n\n> ```js\n> let quoted=1\n> ```\n"));
    }

    #[test]
    fn test_output_closing_fence_is_a_fragment_failure() {
        struct FenceAdapter;
        impl FormatterAdapter for FenceAdapter {
            fn name(&self) -> &str {
                "fence"
            }
            fn is_available(&self) -> bool {
                true
            }
            fn version(&self) -> Result<String> {
                Ok("1".to_string())
            }
            fn format(&self, code: &str, _: &str, _: Option<&FormatOptions>) -> Result<FormatOutcome> {
                Ok(FormatOutcome::from_engine_output(code, "```\n"))
            }
            fn supported_languages(&self) -> Vec<String> {
                vec!["markdown".to_string()]
            }
        }

        let mut registry = FormatterRegistry::new();
        registry.register(Arc::new(FenceAdapter));
        let orchestrator = Orchestrator::new(config_with("fence", &[]), registry);
        let doc = "```md\n# x\n```\n";
        let report = orchestrator.format(doc).unwrap();
        assert_eq!(report.content, doc);
        assert_eq!(report.stats.fragments_failed, 1);
    }

    #[test]
    fn test_format_file_errors() {
        let orchestrator = Orchestrator::new(Config::default(), FormatterRegistry::new());
        let dir = tempfile::tempdir().unwrap();

        let missing = orchestrator.format_file(dir.path().join("missing.md")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(missing.is_structural());

        let binary = dir.path().join("binary.md");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        assert_eq!(orchestrator.format_file(&binary).unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_dispose_on_drop() {
        let adapter = Arc::new(SpacingAdapter::new("spacing", JS_FAMILY));
        {
            let _orchestrator = Orchestrator::new(config_with("spacing", &[]), registry_of(vec![adapter.clone()]));
        }
        assert_eq!(adapter.disposed.load(Ordering::SeqCst), 1);
    }
}
