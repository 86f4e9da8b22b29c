//! Markdown document processing: locate fenced code blocks and splice
//! formatted bodies back into the original text.
//!
//! Reassembly only replaces the byte ranges of block bodies. Every other
//! byte of the document (prose, fences, info strings, indentation, line
//! endings, a leading byte order mark) is copied through untouched, so
//! reassembling with no replacements returns the input exactly.
//!
//! Fenced blocks inside block quotes and indented code blocks are not
//! extracted. Fenced blocks nested in list items are.

mod fence;
pub mod line_ending;
pub mod position;

use pulldown_cmark::Options;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use fence::{FenceSpan, parser_options, scan};
use line_ending::{LineEnding, detect_line_ending_enum, split_lines};
use position::LineIndex;
pub use position::{Point, Position};

const BOM: &str = "\u{feff}";

/// Formatted bodies keyed by fragment index.
pub type Replacements = BTreeMap<usize, String>;

/// One fenced code block lifted out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFragment {
    /// Order of appearance among extracted fragments, from 0
    pub index: usize,
    /// Content without fences or container indentation, LF line endings
    pub value: String,
    /// First word of the info string
    pub language: Option<String>,
    /// Rest of the info string
    pub meta: Option<String>,
    pub position: Position,
    pub fence_char: char,
    pub fence_len: usize,
}

impl CodeFragment {
    /// Whether `body` can go inside this fragment's fences without closing them early.
    pub fn can_hold(&self, body: &str) -> bool {
        !split_lines(body)
            .into_iter()
            .any(|line| fence::is_closing_fence(line, self.fence_char, self.fence_len))
    }
}

/// Fragments plus document-level facts reported alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub fragments: Vec<CodeFragment>,
    pub line_ending: LineEnding,
    pub has_bom: bool,
}

#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    options: Options,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn split_bom(document: &str) -> (&str, &str) {
    match document.strip_prefix(BOM) {
        Some(rest) => (BOM, rest),
        None => ("", document),
    }
}

fn split_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once(char::is_whitespace) {
        Some((language, meta)) => {
            let meta = meta.trim();
            (
                Some(language.to_string()),
                (!meta.is_empty()).then(|| meta.to_string()),
            )
        }
        None => (Some(info.to_string()), None),
    }
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self {
            options: parser_options(),
        }
    }

    fn spans(&self, text: &str) -> Vec<FenceSpan> {
        scan(text, self.options)
    }

    /// Every extractable fenced code block, in document order.
    pub fn extract(&self, document: &str) -> Result<Vec<CodeFragment>> {
        let (_, text) = split_bom(document);
        let index = LineIndex::new(text);

        let fragments = self
            .spans(text)
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                let (language, meta) = split_info(&span.info);
                CodeFragment {
                    index: i,
                    value: span.value,
                    language,
                    meta,
                    position: Position {
                        start: index.point(span.fence_start),
                        end: index.point(span.block_end),
                    },
                    fence_char: span.fence_char,
                    fence_len: span.fence_len,
                }
            })
            .collect();

        log::trace!("[fencefmt-document] Extracted fragments: {fragments:?}");
        Ok(fragments)
    }

    /// [`extract`](Self::extract) plus line ending and byte order mark facts.
    pub fn analyze(&self, document: &str) -> Result<ExtractedDocument> {
        let (bom, text) = split_bom(document);
        Ok(ExtractedDocument {
            fragments: self.extract(document)?,
            line_ending: detect_line_ending_enum(text),
            has_bom: !bom.is_empty(),
        })
    }

    /// Rebuild `document` with the bodies of the fragments named in
    /// `replacements` swapped out.
    ///
    /// Fragments without a replacement keep their original bytes. A
    /// replacement is re-indented to the block's container indentation and
    /// written with the block's line endings. An index past the last
    /// fragment, or a body that would close its fence, is an error.
    pub fn reassemble(&self, document: &str, replacements: &Replacements) -> Result<String> {
        if replacements.is_empty() {
            return Ok(document.to_string());
        }

        let (bom, text) = split_bom(document);
        let spans = self.spans(text);

        if let Some((&index, _)) = replacements.range(spans.len()..).next() {
            return Err(Error::Internal(format!(
                "replacement for fragment {index} but the document has {} fragments",
                spans.len()
            )));
        }

        let mut out = String::with_capacity(document.len() + document.len() / 8);
        out.push_str(bom);
        let mut cursor = 0;

        for (index, replacement) in replacements {
            let span = &spans[*index];
            if span.would_close(replacement) {
                return Err(Error::Internal(format!(
                    "replacement for fragment {index} contains a line that closes its fence"
                )));
            }
            out.push_str(&text[cursor..span.body_start]);
            out.push_str(&span.render_body(replacement, text));
            cursor = span.body_end;
        }
        out.push_str(&text[cursor..]);

        Ok(out)
    }
}
