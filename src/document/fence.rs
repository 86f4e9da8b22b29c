//! Fenced code block scanning.
//!
//! Both extraction and reassembly run the same scan over the same text, so
//! fragment indices line up between the two passes.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;

use super::line_ending::{detect_line_ending, split_lines, terminator_len_at, trim_line_terminator};

pub(crate) fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    options
}

/// A fenced code block with the byte regions reassembly needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FenceSpan {
    /// First fence character
    pub fence_start: usize,
    /// End of the closing fence line (or of the unclosed block), excluding its terminator
    pub block_end: usize,
    /// Start of the first line after the opening fence
    pub body_start: usize,
    /// Whether the opening fence line ends with a terminator
    pub opener_terminated: bool,
    /// Start of the closing fence line, or end of block when unclosed
    pub body_end: usize,
    pub closed: bool,
    pub fence_char: char,
    pub fence_len: usize,
    /// Text after the opening fence, trimmed
    pub info: String,
    /// Content with container indentation removed and LF line endings
    pub value: String,
    /// Indentation put in front of new non-blank content lines
    pub indent: String,
    /// Source prefix of each body line, when the line pairs up with its value line
    pub line_prefixes: Vec<Option<String>>,
    /// Terminator written after content lines
    pub eol: &'static str,
}

struct PendingBlock {
    range: Range<usize>,
    value: String,
}

pub(crate) fn scan(text: &str, options: Options) -> Vec<FenceSpan> {
    let mut spans = Vec::new();
    let mut quote_depth = 0usize;
    let mut pending: Option<PendingBlock> = None;

    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        match event {
            Event::Start(Tag::BlockQuote(_)) => quote_depth += 1,
            Event::End(TagEnd::BlockQuote(_)) => quote_depth = quote_depth.saturating_sub(1),
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) if quote_depth == 0 => {
                pending = Some(PendingBlock {
                    range,
                    value: String::new(),
                });
            }
            Event::Text(content) => {
                if let Some(block) = pending.as_mut() {
                    block.value.push_str(&content);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = pending.take()
                    && let Some(span) = block.finish(text)
                {
                    spans.push(span);
                }
            }
            _ => {}
        }
    }

    spans
}

fn line_start_of(text: &str, offset: usize) -> usize {
    text[..offset].rfind(['\r', '\n']).map(|i| i + 1).unwrap_or(0)
}

fn line_end_of(text: &str, offset: usize) -> usize {
    text[offset..].find(['\r', '\n']).map(|i| offset + i).unwrap_or(text.len())
}

/// Whitespace-only copy of `prefix`, so list markers become spaces.
fn blank_out(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| if c.is_whitespace() { c } else { ' ' })
        .collect()
}

/// What each body line has in front of its de-indented value.
///
/// Body lines and value lines pair up one to one. Blank lines and lines whose
/// source does not end with their value (tabs expanded by the parser) get `None`.
fn line_prefixes(body: &str, value: &str) -> Vec<Option<String>> {
    split_lines(body)
        .into_iter()
        .zip(value.split('\n'))
        .map(|(source, line)| {
            if line.trim().is_empty() {
                None
            } else {
                source.strip_suffix(line).map(str::to_string)
            }
        })
        .collect()
}

/// A run of at least `fence_len` `fence_char`s with only whitespace after it.
fn is_bare_fence(line: &str, fence_char: char, fence_len: usize) -> bool {
    let run = line.chars().take_while(|&c| c == fence_char).count();
    run >= fence_len && line[run * fence_char.len_utf8()..].trim().is_empty()
}

/// Whether content `line` would close a fence of `fence_char` at least
/// `fence_len` long. A closing fence may be indented up to three spaces
/// relative to its container; more makes it a plain content line.
pub(crate) fn is_closing_fence(line: &str, fence_char: char, fence_len: usize) -> bool {
    let line = trim_line_terminator(line);
    let body = line.trim_start_matches(' ');
    line.len() - body.len() <= 3 && is_bare_fence(body, fence_char, fence_len)
}

impl PendingBlock {
    fn finish(self, text: &str) -> Option<FenceSpan> {
        let start = self.range.start.min(text.len());
        let end = self.range.end.clamp(start, text.len());

        let line_start = line_start_of(text, start);
        let line_end = line_end_of(text, start);
        let fence_start = text[start..line_end]
            .find(['`', '~'])
            .map(|i| start + i)
            .or_else(|| text[line_start..line_end].find(['`', '~']).map(|i| line_start + i))?;

        let fence_char = text[fence_start..].chars().next()?;
        let fence_len = text[fence_start..line_end]
            .chars()
            .take_while(|&c| c == fence_char)
            .count();
        let info = text[fence_start + fence_len..line_end].trim().to_string();

        let opener_terminated = line_end < text.len();
        let body_start = line_end + terminator_len_at(text, line_end);
        let end = end.max(body_start);

        // The last line of the block is the closing fence, if the block was closed.
        let region = trim_line_terminator(&text[body_start..end]);
        let region_end = body_start + region.len();
        let last_line_start = line_start_of(text, region_end).max(body_start);
        let last_line = text[last_line_start..region_end].trim_start();
        let closed = !region.is_empty() && is_bare_fence(last_line, fence_char, fence_len);

        let (body_end, block_end) = if closed {
            (last_line_start, region_end)
        } else {
            (end, region_end)
        };

        let value = normalize_line_endings(&self.value);

        let body = &text[body_start..body_end];
        let indent = blank_out(&text[line_start..fence_start]);
        let line_prefixes = line_prefixes(body, &value);
        let eol = if body.contains("\r\n") {
            "\r\n"
        } else if body.contains('\n') {
            "\n"
        } else if body.contains('\r') {
            "\r"
        } else {
            match terminator_len_at(text, line_end) {
                2 => "\r\n",
                1 if text[line_end..].starts_with('\r') => "\r",
                1 => "\n",
                _ => detect_line_ending(text),
            }
        };

        Some(FenceSpan {
            fence_start,
            block_end,
            body_start,
            opener_terminated,
            body_end,
            closed,
            fence_char,
            fence_len,
            info,
            value,
            indent,
            line_prefixes,
            eol,
        })
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

impl FenceSpan {
    /// Body text to splice in for `replacement`, indented and terminated like the original.
    ///
    /// A line identical to the original value line at the same position keeps
    /// its source prefix; other lines get the block's indentation.
    pub fn render_body(&self, replacement: &str, text: &str) -> String {
        let normalized = normalize_line_endings(replacement);
        if normalized.is_empty() {
            return String::new();
        }

        let original = &text[self.body_start..self.body_end];
        let terminate = self.closed || original.ends_with(['\n', '\r']);
        let value_lines: Vec<&str> = self.value.split('\n').collect();

        let content = normalized.strip_suffix('\n').unwrap_or(&normalized);
        let mut out = String::with_capacity(normalized.len() + self.indent.len() * 8);
        if !self.opener_terminated {
            out.push_str(self.eol);
        }
        for (i, line) in content.split('\n').enumerate() {
            if i > 0 {
                out.push_str(self.eol);
            }
            if line.is_empty() {
                continue;
            }
            let prefix = match (self.line_prefixes.get(i), value_lines.get(i)) {
                (Some(Some(prefix)), Some(&source)) if source == line => prefix.as_str(),
                _ => self.indent.as_str(),
            };
            out.push_str(prefix);
            out.push_str(line);
        }
        if terminate {
            out.push_str(self.eol);
        }
        out
    }

    /// Whether `replacement` has a line that would close this fence early.
    pub fn would_close(&self, replacement: &str) -> bool {
        split_lines(replacement)
            .into_iter()
            .any(|line| is_closing_fence(line, self.fence_char, self.fence_len))
    }
}
