//! Baseline markdownlint rule tables for each [`Preset`].
//!
//! These tables are consumed by external lint tooling; their contents are part
//! of the compatibility surface and must not drift between releases.

use indexmap::IndexMap;
use serde_json::{Value, json};

use super::types::Preset;

/// Line length enforced by the strict preset.
pub const STRICT_LINE_LENGTH: u64 = 80;

/// The baseline rule table for `preset`, keyed by markdownlint rule id.
pub fn preset_rules(preset: Preset) -> IndexMap<String, Value> {
    let entries: Vec<(&str, Value)> = match preset {
        Preset::Strict => vec![
            ("default", json!(true)),
            ("MD001", json!(true)),
            ("MD003", json!({ "style": "atx" })),
            ("MD004", json!({ "style": "consistent" })),
            ("MD005", json!(true)),
            ("MD007", json!({ "indent": 2 })),
            ("MD009", json!(true)),
            ("MD010", json!(true)),
            ("MD012", json!(true)),
            (
                "MD013",
                json!({ "line_length": STRICT_LINE_LENGTH, "code_blocks": false, "tables": false }),
            ),
            ("MD018", json!(true)),
            ("MD019", json!(true)),
            ("MD022", json!(true)),
            ("MD023", json!(true)),
            ("MD024", json!(true)),
            ("MD025", json!(true)),
            ("MD030", json!(true)),
            ("MD031", json!(true)),
            ("MD032", json!(true)),
            ("MD047", json!(true)),
        ],
        Preset::Standard => vec![
            ("default", json!(true)),
            ("MD001", json!(true)),
            ("MD009", json!(true)),
            ("MD010", json!(false)),
            ("MD012", json!(true)),
            ("MD013", json!(false)),
            ("MD018", json!(true)),
            ("MD022", json!(true)),
            ("MD024", json!(false)),
            ("MD030", json!(true)),
            ("MD047", json!(true)),
        ],
        Preset::Relaxed => vec![
            ("default", json!(false)),
            ("MD001", json!(true)),
            ("MD018", json!(true)),
            ("MD030", json!(true)),
            ("MD009", json!(true)),
            ("MD047", json!(true)),
        ],
    };

    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
