//! Project configuration.
//!
//! This module defines the configuration model, how it is read and validated
//! from JSON, YAML or TOML sources, and how it is compiled into the
//! configuration files consumed by external lint and format engines.

pub mod types;
pub use types::*;

mod loading;
pub use loading::{CONFIG_FILE_NAMES, ConfigFormat, ConfigReader};

mod validation;
pub use validation::validate_config;

pub mod compiler;
pub use compiler::{ConfigCompiler, GeneratedConfigs, GeneratedFile};

pub mod presets;
pub mod rule_names;
