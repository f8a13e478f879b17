//! Line-indexed view over a do-file buffer.
//!
//! Every analysis in this crate is a single forward pass over lines, so the
//! document model is deliberately minimal: an immutable `Vec<String>` with
//! total accessors. There is no incremental state; callers re-parse on every
//! change and the functions here never panic on out-of-range input.

/// An immutable, line-indexed snapshot of a do-file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoDocument {
    lines: Vec<String>,
}

impl DoDocument {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of the line at `index`, or `""` when out of range.
    pub fn line(&self, index: usize) -> &str {
        self.lines.get(index).map_or("", String::as_str)
    }

    /// Line width in UTF-16 code units, the unit LSP positions are measured in.
    pub fn line_len_utf16(&self, index: usize) -> usize {
        self.line(index).encode_utf16().count()
    }

    /// Applies full-line replacements, yielding the resulting document.
    pub fn apply(&self, edits: &[LineEdit]) -> DoDocument {
        let mut lines = self.lines.clone();
        for edit in edits {
            if let Some(slot) = lines.get_mut(edit.line) {
                *slot = edit.new_text.clone();
            }
        }
        DoDocument { lines }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A full-line replacement, the only edit shape the transforms produce.
///
/// The editor is expected to replace the whole of line `line` (column 0 to
/// its end) with `new_text` and to batch all edits of one pass into a single
/// atomic apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub line: usize,
    pub new_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_lines() {
        let document = DoDocument::new("");
        assert_eq!(document.line_count(), 0);
        assert_eq!(document.line(0), "");
    }

    #[test]
    fn trailing_newline_does_not_add_a_line() {
        let document = DoDocument::new("display 1\n");
        assert_eq!(document.line_count(), 1);
        assert_eq!(document.line(0), "display 1");
    }

    #[test]
    fn crlf_is_stripped() {
        let document = DoDocument::new("use data.dta\r\nlist\r\n");
        assert_eq!(document.line(0), "use data.dta");
        assert_eq!(document.line(1), "list");
    }

    #[test]
    fn utf16_width_counts_code_units() {
        // Two CJK points are one unit each, the emoji is a surrogate pair.
        let document = DoDocument::new("** # 模型 🎯");
        assert_eq!(document.line_len_utf16(0), 10);
    }

    #[test]
    fn apply_replaces_whole_lines() {
        let document = DoDocument::new("a\nb\nc");
        let edited = document.apply(&[LineEdit {
            line: 1,
            new_text: "B".into(),
        }]);
        assert_eq!(edited.text(), "a\nB\nc");
    }
}
