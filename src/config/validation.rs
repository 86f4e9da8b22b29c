//! Fail-fast schema validation of a decoded configuration value.
//!
//! Checks run in a fixed order and the first violation wins. Only once the
//! raw shape is known to be sound is it deserialized into [`Config`].

use serde_json::{Map, Value};

use super::types::{Config, Preset, SUPPORTED_CONFIG_VERSION};
use crate::error::{Error, Result};

/// Validate a decoded configuration and convert it into a typed [`Config`].
pub fn validate_config(raw: &Value) -> Result<Config> {
    let root = raw
        .as_object()
        .ok_or_else(|| Error::validation("$", format!("expected a mapping, found {}", type_name(raw))))?;

    check_version(root)?;
    check_preset(root)?;
    check_rules(root)?;
    check_formatters(root)?;
    check_formatter_options(root)?;
    check_ignores(root)?;
    check_terminology(root)?;
    check_output(root)?;

    let config: Config = serde_json::from_value(raw.clone()).map_err(|e| Error::validation("$", e.to_string()))?;
    // Glob syntax is only known once the strings are typed.
    config.ignore_set()?;
    Ok(config)
}

fn check_version(root: &Map<String, Value>) -> Result<()> {
    let version = root
        .get("version")
        .ok_or_else(|| Error::validation("version", "missing required field"))?;
    match version.as_u64() {
        Some(SUPPORTED_CONFIG_VERSION) => Ok(()),
        Some(other) => Err(Error::validation(
            "version",
            format!("unsupported version {other}, expected {SUPPORTED_CONFIG_VERSION}"),
        )),
        None => Err(Error::validation(
            "version",
            format!("expected an integer, found {}", type_name(version)),
        )),
    }
}

fn check_preset(root: &Map<String, Value>) -> Result<()> {
    let Some(preset) = root.get("preset") else {
        return Ok(());
    };
    let name = preset
        .as_str()
        .ok_or_else(|| Error::validation("preset", format!("expected a string, found {}", type_name(preset))))?;
    name.parse::<Preset>().map(|_| ()).map_err(|e| Error::validation("preset", e))
}

fn check_rules(root: &Map<String, Value>) -> Result<()> {
    expect_optional_map(root, "rules").map(|_| ())
}

fn check_formatters(root: &Map<String, Value>) -> Result<()> {
    let Some(formatters) = expect_optional_map(root, "formatters")? else {
        return Ok(());
    };

    match formatters.get("default") {
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(Error::validation(
                "formatters.default",
                format!("expected a string, found {}", type_name(other)),
            ));
        }
        None => return Err(Error::validation("formatters.default", "missing required field")),
    }

    let Some(languages) = formatters.get("languages") else {
        return Ok(());
    };
    let languages = languages.as_object().ok_or_else(|| {
        Error::validation(
            "formatters.languages",
            format!("expected a mapping, found {}", type_name(languages)),
        )
    })?;
    for (language, engine) in languages {
        if !engine.is_string() {
            return Err(Error::validation(
                format!("formatters.languages.{language}"),
                format!("expected a string, found {}", type_name(engine)),
            ));
        }
    }
    Ok(())
}

fn check_formatter_options(root: &Map<String, Value>) -> Result<()> {
    let Some(options) = expect_optional_map(root, "formatterOptions")? else {
        return Ok(());
    };
    for (engine, bag) in options {
        if !bag.is_object() {
            return Err(Error::validation(
                format!("formatterOptions.{engine}"),
                format!("expected a mapping, found {}", type_name(bag)),
            ));
        }
    }
    Ok(())
}

fn check_ignores(root: &Map<String, Value>) -> Result<()> {
    let Some(ignores) = root.get("ignores") else {
        return Ok(());
    };
    let items = ignores
        .as_array()
        .ok_or_else(|| Error::validation("ignores", format!("expected a list, found {}", type_name(ignores))))?;
    for (i, item) in items.iter().enumerate() {
        if !item.is_string() {
            return Err(Error::validation(
                format!("ignores[{i}]"),
                format!("expected a string, found {}", type_name(item)),
            ));
        }
    }
    Ok(())
}

fn check_terminology(root: &Map<String, Value>) -> Result<()> {
    let Some(terminology) = root.get("terminology") else {
        return Ok(());
    };
    let entries = terminology.as_array().ok_or_else(|| {
        Error::validation(
            "terminology",
            format!("expected a list, found {}", type_name(terminology)),
        )
    })?;

    for (i, entry) in entries.iter().enumerate() {
        let field = format!("terminology[{i}]");
        let entry = entry
            .as_object()
            .ok_or_else(|| Error::validation(&field, format!("expected a mapping, found {}", type_name(entry))))?;
        for key in ["incorrect", "correct"] {
            match entry.get(key) {
                Some(Value::String(_)) => {}
                Some(other) => {
                    return Err(Error::validation(
                        format!("{field}.{key}"),
                        format!("expected a string, found {}", type_name(other)),
                    ));
                }
                None => return Err(Error::validation(format!("{field}.{key}"), "missing required field")),
            }
        }
        if let Some(case_sensitive) = entry.get("caseSensitive")
            && !case_sensitive.is_boolean()
        {
            return Err(Error::validation(
                format!("{field}.caseSensitive"),
                format!("expected a boolean, found {}", type_name(case_sensitive)),
            ));
        }
    }
    Ok(())
}

fn check_output(root: &Map<String, Value>) -> Result<()> {
    let Some(output) = expect_optional_map(root, "output")? else {
        return Ok(());
    };
    for key in ["diagnostics", "progress", "color"] {
        if let Some(value) = output.get(key)
            && !value.is_boolean()
        {
            return Err(Error::validation(
                format!("output.{key}"),
                format!("expected a boolean, found {}", type_name(value)),
            ));
        }
    }
    Ok(())
}

fn expect_optional_map<'a>(root: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Map<String, Value>>> {
    match root.get(key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(Error::validation(
            key,
            format!("expected a mapping, found {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
