//! Language alias resolution for fence info strings.
//!
//! Maps the tags people write on fences (`js`, `yml`, `sh`) to the canonical
//! names routing and the engines work with (`javascript`, `yaml`, `shell`).

use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical language -> aliases. Canonical names resolve to themselves.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "node", "nodejs", "mjs", "cjs", "es6", "ecmascript"]),
    ("typescript", &["ts", "mts", "cts"]),
    ("jsx", &[]),
    ("tsx", &[]),
    ("json", &["jsonc", "json5", "webmanifest"]),
    ("css", &[]),
    ("scss", &[]),
    ("less", &[]),
    ("html", &["htm", "xhtml"]),
    ("vue", &[]),
    ("yaml", &["yml"]),
    ("markdown", &["md", "mkd", "mdown"]),
    ("graphql", &["gql"]),
    ("handlebars", &["hbs", "htmlbars"]),
    ("python", &["py", "python3", "py3"]),
    ("shell", &["bash", "sh", "zsh", "ksh", "shellscript", "console"]),
    ("rust", &["rs"]),
    ("go", &["golang"]),
    ("ruby", &["rb"]),
    ("toml", &[]),
    ("sql", &["mysql", "postgresql", "postgres", "sqlite"]),
    ("text", &["txt", "plaintext", "plain"]),
];

/// File extension used for the stub path an engine infers its parser from.
const EXTENSIONS: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("typescript", "ts"),
    ("jsx", "jsx"),
    ("tsx", "tsx"),
    ("json", "json"),
    ("css", "css"),
    ("scss", "scss"),
    ("less", "less"),
    ("html", "html"),
    ("vue", "vue"),
    ("yaml", "yaml"),
    ("markdown", "md"),
    ("graphql", "graphql"),
    ("handlebars", "hbs"),
];

static ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    for (canonical, aliases) in LANGUAGES {
        m.insert(*canonical, *canonical);
        for alias in *aliases {
            m.insert(*alias, *canonical);
        }
    }
    m
});

/// Resolver for language aliases to canonical names.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageResolver;

impl LanguageResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a fence language tag to its canonical name.
    ///
    /// Unknown tags come back lowercased.
    pub fn resolve(&self, language: &str) -> String {
        let lower = language.trim().to_lowercase();
        ALIASES.get(lower.as_str()).map(|&s| s.to_string()).unwrap_or(lower)
    }

    pub fn is_known(&self, language: &str) -> bool {
        ALIASES.contains_key(language.trim().to_lowercase().as_str())
    }
}

/// Stub file extension for a canonical language, if any engine handles it.
pub fn file_extension(language: &str) -> Option<&'static str> {
    EXTENSIONS.iter().find(|(l, _)| *l == language).map(|(_, ext)| *ext)
}

/// Stub file name an engine uses to pick its parser for `language`.
pub fn stub_file_name(language: &str) -> Option<String> {
    file_extension(language).map(|ext| format!("fencefmt-fragment.{ext}"))
}
