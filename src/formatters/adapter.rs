//! The capability interface every formatting engine is consumed through.

use crate::config::OptionBag;
use crate::error::Result;

/// Engine option bag handed to [`FormatterAdapter::format`].
pub type FormatOptions = OptionBag;

/// Result of formatting one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub formatted: String,
    pub did_change: bool,
}

impl FormatOutcome {
    /// Build an outcome from raw engine output.
    ///
    /// Line terminators are normalised to LF and the input's trailing-newline
    /// shape is kept, so an engine appending a final newline does not count as
    /// a change.
    pub fn from_engine_output(input: &str, output: &str) -> Self {
        let mut formatted = output.replace("\r\n", "\n");
        if input.ends_with('\n') {
            if !formatted.ends_with('\n') {
                formatted.push('\n');
            }
        } else {
            while formatted.ends_with('\n') {
                formatted.pop();
            }
        }
        let did_change = formatted != input;
        Self { formatted, did_change }
    }

    pub fn unchanged(input: &str) -> Self {
        Self {
            formatted: input.to_string(),
            did_change: false,
        }
    }
}

/// Uniform wrapper around one external formatting engine.
///
/// Implementations acquire their engine lazily on first use, keep it for the
/// lifetime of the adapter, and release it in [`dispose`](Self::dispose).
/// Nothing engine-specific crosses this boundary.
pub trait FormatterAdapter: Send + Sync {
    /// Registry name, e.g. `"prettier"`.
    fn name(&self) -> &str;

    /// Whether the engine can be used. Never fails; acquisition problems
    /// report `false`.
    fn is_available(&self) -> bool;

    /// Engine version, or `NotFound` when the engine is unavailable.
    fn version(&self) -> Result<String>;

    /// Format `code` written in the canonical `language`.
    fn format(&self, code: &str, language: &str, options: Option<&FormatOptions>) -> Result<FormatOutcome>;

    /// Canonical language names this engine formats.
    fn supported_languages(&self) -> Vec<String>;

    fn supports(&self, language: &str) -> bool {
        self.supported_languages().iter().any(|l| l == language)
    }

    /// Release the acquired engine. The next use acquires it again.
    fn dispose(&self) {}
}
