#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Crlf,
    /// Bare carriage returns, as classic Mac files use
    Cr,
    Mixed,
}

impl LineEnding {
    /// Terminator to write; mixed documents get the more common one.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
            Self::Lf | Self::Mixed => "\n",
        }
    }
}

/// (CRLF, lone LF, lone CR) counts.
fn count_terminators(content: &str) -> (usize, usize, usize) {
    let crlf = content.matches("\r\n").count();
    let lf = content.matches('\n').count() - crlf;
    let cr = content.matches('\r').count() - crlf;
    (crlf, lf, cr)
}

pub fn detect_line_ending_enum(content: &str) -> LineEnding {
    match count_terminators(content) {
        (0, _, 0) => LineEnding::Lf,
        (_, 0, 0) => LineEnding::Crlf,
        (0, 0, _) => LineEnding::Cr,
        _ => LineEnding::Mixed,
    }
}

/// The dominant terminator of `content`, LF on ties or when there is none.
pub fn detect_line_ending(content: &str) -> &'static str {
    let (crlf, lf, cr) = count_terminators(content);
    if crlf > lf && crlf >= cr {
        "\r\n"
    } else if cr > lf && cr > crlf {
        "\r"
    } else {
        "\n"
    }
}

/// Byte length of the line terminator starting at `pos`, 0 if there is none.
pub fn terminator_len_at(content: &str, pos: usize) -> usize {
    let rest = &content.as_bytes()[pos.min(content.len())..];
    match rest {
        [b'\r', b'\n', ..] => 2,
        [b'\r' | b'\n', ..] => 1,
        _ => 0,
    }
}

/// Strip one trailing `\n`, `\r\n` or `\r`.
pub fn trim_line_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix(['\n', '\r']))
        .unwrap_or(line)
}

/// Split on every line terminator. Like `str::split('\n')`, a trailing
/// terminator yields a final empty piece.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    while let Some(i) = content[pos..].find(['\r', '\n']) {
        let at = pos + i;
        lines.push(&content[start..at]);
        pos = at + terminator_len_at(content, at);
        start = pos;
    }
    lines.push(&content[start..]);
    lines
}
