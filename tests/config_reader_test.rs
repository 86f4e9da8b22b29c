use fencefmt::config::{ConfigReader, Preset};
use fencefmt::{ConfigCompiler, ErrorKind};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

mod common;
use common::write_file;

#[test]
fn test_same_config_in_every_format() {
    let temp_dir = TempDir::new().unwrap();
    let json = write_file(
        temp_dir.path(),
        "a.json",
        r#"{
            "version": 1,
            "preset": "strict",
            "formatters": { "default": "prettier", "languages": { "ts": "biome", "python": "none" } },
            "ignores": ["vendor/**"]
        }"#,
    );
    let yaml = write_file(
        temp_dir.path(),
        "b.yaml",
        "version: 1\npreset: strict\nformatters:\n  default: prettier\n  languages:\n    ts: biome\n    python: none\nignores:\n  - \"vendor/**\"\n",
    );
    let toml = write_file(
        temp_dir.path(),
        "c.toml",
        "version = 1\npreset = \"strict\"\nignores = [\"vendor/**\"]\n\n[formatters]\ndefault = \"prettier\"\n\n[formatters.languages]\nts = \"biome\"\npython = \"none\"\n",
    );

    let from_json = ConfigReader::read(&json).unwrap();
    let from_yaml = ConfigReader::read(&yaml).unwrap();
    let from_toml = ConfigReader::read(&toml).unwrap();

    assert_eq!(from_json, from_yaml);
    assert_eq!(from_json, from_toml);
    assert_eq!(from_json.preset, Preset::Strict);
    assert_eq!(from_json.formatters.languages["ts"], "biome");
    assert!(from_json.is_ignored(std::path::Path::new("vendor/lib/README.md")));
    assert!(!from_json.is_ignored(std::path::Path::new("docs/README.md")));
}

#[test]
fn test_error_taxonomy() {
    let temp_dir = TempDir::new().unwrap();

    let missing = ConfigReader::read(temp_dir.path().join("nope.json")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let broken = write_file(temp_dir.path(), "broken.json", "{ \"version\": 1,");
    assert_eq!(ConfigReader::read(&broken).unwrap_err().kind(), ErrorKind::Parse);

    let old = write_file(temp_dir.path(), "old.json", r#"{ "version": 2 }"#);
    let err = ConfigReader::read(&old).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("version"));

    let bad_language = write_file(
        temp_dir.path(),
        "lang.yaml",
        "version: 1\nformatters:\n  default: prettier\n  languages:\n    javascript: 3\n",
    );
    let err = ConfigReader::read(&bad_language).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("formatters.languages.javascript"));
}

#[test]
fn test_discovery_walks_up_to_repository_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir(root.join(".git")).unwrap();
    write_file(root, ".fencefmt.yaml", "version: 1\npreset: relaxed\n");
    let nested = root.join("docs").join("guide");
    std::fs::create_dir_all(&nested).unwrap();

    let found = ConfigReader::discover(&nested).unwrap();
    assert_eq!(found, root.join(".fencefmt.yaml"));

    let config = ConfigReader::load(None, &nested).unwrap();
    assert_eq!(config.preset, Preset::Relaxed);
}

#[test]
fn test_compile_read_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        ".fencefmt.json",
        r#"{
            "version": 1,
            "preset": "standard",
            "rules": { "line-length": { "line_length": 120 } },
            "formatters": { "default": "prettier", "languages": { "typescript": "biome", "go": "gofmt" } },
            "formatterOptions": { "prettier": { "printWidth": 100 } },
            "terminology": [{ "incorrect": "javascript", "correct": "JavaScript" }]
        }"#,
    );
    let config = ConfigReader::read(&path).unwrap();
    let generated = ConfigCompiler::compile(&config).unwrap();

    assert_eq!(generated.lint["config"]["MD013"]["line_length"], 120);
    assert_eq!(generated.lint["config"]["terminology"]["terms"][0]["caseSensitive"], false);
    assert_eq!(generated.unknown_engines, vec!["gofmt".to_string()]);

    let names: Vec<_> = generated.files().unwrap().iter().map(|f| f.file_name).collect();
    assert_eq!(names, vec![".markdownlint-cli2.jsonc", ".prettierrc.json", "biome.json"]);
}
