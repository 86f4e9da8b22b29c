#![no_main]

//! Extraction and reassembly must never panic, and reassembling without
//! replacements must give back the input unchanged.

use fencefmt::DocumentProcessor;
use fencefmt::document::Replacements;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    if content.len() > 50_000 {
        return;
    }

    let processor = DocumentProcessor::new();
    let Ok(fragments) = processor.extract(content) else {
        return;
    };

    let unchanged = processor
        .reassemble(content, &Replacements::new())
        .expect("reassembly without replacements failed");
    assert_eq!(unchanged, content, "reassembly without replacements changed the document");

    let markers: Replacements = fragments
        .iter()
        .map(|f| (f.index, format!("marker_{}\n", f.index)))
        .collect();
    let _ = processor.reassemble(content, &markers);
});
