#![no_main]

//! Config decoding and validation must reject bad input with an error, never a panic.

use fencefmt::ConfigCompiler;
use fencefmt::config::{ConfigFormat, ConfigReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    for format in [ConfigFormat::Json, ConfigFormat::Yaml, ConfigFormat::Toml] {
        if let Ok(config) = ConfigReader::parse_str(content, Some(format), "fuzz") {
            let _ = ConfigCompiler::compile(&config);
        }
    }
});
