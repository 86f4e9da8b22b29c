use std::fmt;

/// 1-based line and column (columns count characters, not bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

/// Byte offset -> line/column lookup over one text.
pub(crate) struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.match_indices(['\r', '\n'])
                .filter(|&(i, t)| t == "\n" || !text[i + 1..].starts_with('\n'))
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    pub fn point(&self, offset: usize) -> Point {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = self
            .text
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);
        Point {
            line: line + 1,
            column: column + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points() {
        let text = "ab\ncdé\n\nx";
        let index = LineIndex::new(text);
        assert_eq!(index.point(0), Point { line: 1, column: 1 });
        assert_eq!(index.point(2), Point { line: 1, column: 3 });
        assert_eq!(index.point(3), Point { line: 2, column: 1 });
        // 'é' is two bytes but one column
        assert_eq!(index.point(7), Point { line: 2, column: 4 });
        assert_eq!(index.point(8), Point { line: 3, column: 1 });
        assert_eq!(index.point(9), Point { line: 4, column: 1 });
        assert_eq!(index.point(100), Point { line: 4, column: 2 });
    }

    #[test]
    fn test_points_with_crlf_and_bare_cr() {
        let text = "a\r\nb\rc";
        let index = LineIndex::new(text);
        assert_eq!(index.point(3), Point { line: 2, column: 1 });
        assert_eq!(index.point(5), Point { line: 3, column: 1 });
    }
}
