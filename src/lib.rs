//! fencefmt formats the fenced code blocks embedded in Markdown documents
//! with external formatting engines and leaves everything else byte for byte
//! as it was.
//!
//! ```no_run
//! use fencefmt::{ConfigReader, Orchestrator};
//!
//! let config = ConfigReader::read(".fencefmt.json")?;
//! let orchestrator = Orchestrator::with_builtin_engines(config);
//! let report = orchestrator.format_file("README.md")?;
//! println!("{} code blocks formatted", report.stats.fragments_formatted);
//! # Ok::<(), fencefmt::Error>(())
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod formatters;
pub mod orchestrator;

pub use config::{Config, ConfigCompiler, ConfigReader, GeneratedConfigs};
pub use document::{CodeFragment, DocumentProcessor};
pub use error::{Error, ErrorKind, Result};
pub use formatters::{FormatOutcome, FormatterAdapter, FormatterRegistry};
pub use orchestrator::{FormatReport, FragmentWarning, Orchestrator, RunStats};
