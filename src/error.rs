//! Error taxonomy shared by every fencefmt operation.
//!
//! Each public operation returns `Result<T, Error>`. Structural failures (an
//! unreadable or unparseable source, a reassembly failure) abort the whole
//! operation. Per-fragment failures (`FormatterFailed`, `FormatterTimeout`, a
//! missing engine) are recovered by the orchestrator and reported as warnings.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Parse,
    FormatterFailed,
    FormatterTimeout,
    Io,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not-found",
            Self::Validation => "validation",
            Self::Parse => "parse",
            Self::FormatterFailed => "formatter-failed",
            Self::FormatterTimeout => "formatter-timeout",
            Self::Io => "io",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// What a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// A file on disk (config source or document).
    File(PathBuf),
    /// An external formatting engine.
    Engine(String),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file '{}'", path.display()),
            Self::Engine(name) => write!(f, "formatter '{name}'"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A file is missing, or an engine is not installed or not usable.
    #[error("{0} not found")]
    NotFound(Missing),

    /// Schema violation or unsupported configuration version.
    #[error("invalid configuration at '{field}': {message}")]
    Validation { field: String, message: String },

    /// Malformed configuration or document source.
    #[error("failed to parse {source_name}: {message}")]
    Parse { source_name: String, message: String },

    /// The engine rejected the input. `diagnostic` is the engine's own text.
    #[error("formatter '{engine}' failed: {diagnostic}")]
    FormatterFailed { engine: String, diagnostic: String },

    /// The engine did not finish within the allotted time.
    #[error("formatter '{engine}' timed out after {timeout_ms}ms")]
    FormatterTimeout { engine: String, timeout_ms: u64 },

    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::FormatterFailed { .. } => ErrorKind::FormatterFailed,
            Self::FormatterTimeout { .. } => ErrorKind::FormatterTimeout,
            Self::Io { .. } => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error aborts a whole run rather than a single fragment.
    pub fn is_structural(&self) -> bool {
        match self {
            Self::NotFound(Missing::Engine(_)) | Self::FormatterFailed { .. } | Self::FormatterTimeout { .. } => false,
            Self::NotFound(Missing::File(_))
            | Self::Validation { .. }
            | Self::Parse { .. }
            | Self::Io { .. }
            | Self::Internal(_) => true,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn parse(source_name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn engine_missing(engine: impl Into<String>) -> Self {
        Self::NotFound(Missing::Engine(engine.into()))
    }

    /// Map a filesystem error, turning `ErrorKind::NotFound` into [`Error::NotFound`].
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(Missing::File(path))
        } else {
            Self::Io { path, source }
        }
    }
}
