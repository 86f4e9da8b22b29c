use std::path::{Path, PathBuf};

use super::types::Config;
use super::validation::validate_config;
use crate::error::{Error, Result};

/// Config file names searched by [`ConfigReader::discover`], in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".fencefmt.json",
    ".fencefmt.yaml",
    ".fencefmt.yml",
    ".fencefmt.toml",
    "fencefmt.json",
];

/// Serialization format of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" | "jsonc" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Loads and validates configuration sources.
pub struct ConfigReader;

impl ConfigReader {
    /// Read, decode and validate the configuration at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        log::debug!("[fencefmt-config] Loading {}", path.display());
        Self::parse_str(&content, ConfigFormat::from_path(path), &path.display().to_string())
    }

    /// Decode and validate an in-memory configuration source.
    ///
    /// With no explicit format, JSON is tried first and YAML second.
    pub fn parse_str(content: &str, format: Option<ConfigFormat>, source_name: &str) -> Result<Config> {
        let raw = Self::decode(content, format, source_name)?;
        validate_config(&raw)
    }

    /// Decode a configuration source into an untyped value without validating it.
    pub fn decode(content: &str, format: Option<ConfigFormat>, source_name: &str) -> Result<serde_json::Value> {
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
        match format {
            Some(ConfigFormat::Json) => serde_json::from_str(content).map_err(|e| Error::parse(source_name, e)),
            Some(ConfigFormat::Yaml) => serde_yml::from_str(content).map_err(|e| Error::parse(source_name, e)),
            Some(ConfigFormat::Toml) => {
                let table: toml::Table = toml::from_str(content).map_err(|e| Error::parse(source_name, e))?;
                serde_json::to_value(table).map_err(|e| Error::parse(source_name, e))
            }
            None => serde_json::from_str(content)
                .or_else(|_| serde_yml::from_str(content))
                .map_err(|e| Error::parse(source_name, format!("not valid JSON or YAML: {e}"))),
        }
    }

    /// Find the nearest configuration file, walking up from `start_dir`.
    ///
    /// The search stops after the first directory that contains `.git`.
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);
        while let Some(dir) = current {
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    log::debug!("[fencefmt-config] Found config file: {}", candidate.display());
                    return Some(candidate);
                }
            }
            if dir.join(".git").exists() {
                log::debug!("[fencefmt-config] Stopping config search at repository root {}", dir.display());
                break;
            }
            current = dir.parent();
        }
        None
    }

    /// Load an explicit config, or the discovered one, or fall back to defaults.
    pub fn load(explicit: Option<&Path>, start_dir: &Path) -> Result<Config> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::discover(start_dir) {
                Some(path) => Self::read(path),
                None => {
                    log::debug!("[fencefmt-config] No config file found, using defaults");
                    Ok(Config::default())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Preset;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".fencefmt.json");
        fs::write(&path, r#"{ "version": 1, "preset": "relaxed" }"#).unwrap();

        let config = ConfigReader::read(&path).unwrap();
        assert_eq!(config.preset, Preset::Relaxed);
    }

    #[test]
    fn test_read_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".fencefmt.yaml");
        fs::write(
            &path,
            "version: 1\nformatters:\n  default: biome\n  languages:\n    yaml: prettier\n",
        )
        .unwrap();

        let config = ConfigReader::read(&path).unwrap();
        assert_eq!(config.formatters.default, "biome");
        assert_eq!(config.formatters.languages["yaml"], "prettier");
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".fencefmt.toml");
        fs::write(
            &path,
            "version = 1\nignores = [\"vendor/**\"]\n\n[formatterOptions.prettier]\nprintWidth = 100\n",
        )
        .unwrap();

        let config = ConfigReader::read(&path).unwrap();
        assert_eq!(config.ignores, vec!["vendor/**"]);
        assert_eq!(config.formatter_options["prettier"]["printWidth"], 100);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = ConfigReader::read(dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_malformed_source_is_parse_error() {
        let err = ConfigReader::parse_str("{ \"version\": ", Some(ConfigFormat::Json), "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_schema_violation_is_validation_error() {
        let err = ConfigReader::parse_str("version: 3\n", Some(ConfigFormat::Yaml), "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_yaml() {
        let config = ConfigReader::parse_str("version: 1\npreset: strict\n", None, "inline").unwrap();
        assert_eq!(config.preset, Preset::Strict);
    }

    #[test]
    fn test_bom_is_ignored() {
        let config = ConfigReader::parse_str("\u{FEFF}{\"version\": 1}", Some(ConfigFormat::Json), "inline").unwrap();
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_discover_walks_up_to_git_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("docs/guide")).unwrap();
        fs::write(root.join(".fencefmt.yml"), "version: 1\n").unwrap();

        let found = ConfigReader::discover(&root.join("docs/guide")).unwrap();
        assert_eq!(found, root.join(".fencefmt.yml"));
    }

    #[test]
    fn test_discover_prefers_json() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".fencefmt.toml"), "version = 1\n").unwrap();
        fs::write(dir.path().join(".fencefmt.json"), "{\"version\": 1}").unwrap();

        assert_eq!(
            ConfigReader::discover(dir.path()),
            Some(dir.path().join(".fencefmt.json"))
        );
    }

    #[test]
    fn test_load_defaults_without_file() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let config = ConfigReader::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }
}
