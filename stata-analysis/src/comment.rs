//! Comment toggling for do-file lines.
//!
//! Stata accepts `//` and `*` line comments and `/* ... */` blocks; which
//! one the toggle uses is a user setting passed through verbatim.

use crate::document::{DoDocument, LineEdit};

/// The configured comment flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentStyle {
    /// A line prefix such as `// ` or `* `, kept exactly as configured.
    Line(String),
    /// Wrap the line in `/* ... */`.
    Block,
}

impl CommentStyle {
    /// Interprets the raw `commentStyle` setting.
    pub fn from_setting(setting: &str) -> CommentStyle {
        if setting == "/* ... */" {
            CommentStyle::Block
        } else {
            CommentStyle::Line(setting.to_string())
        }
    }
}

fn toggle_line(trimmed: &str, style: &CommentStyle) -> String {
    match style {
        CommentStyle::Block => {
            if trimmed.starts_with("/*") && trimmed.ends_with("*/") && trimmed.len() >= 4 {
                trimmed
                    .strip_prefix("/*")
                    .and_then(|rest| rest.strip_suffix("*/"))
                    .unwrap_or(trimmed)
                    .trim()
                    .to_string()
            } else {
                format!("/* {trimmed} */")
            }
        }
        CommentStyle::Line(prefix) => {
            let base = prefix.trim();
            match trimmed.strip_prefix(base) {
                Some(rest) => rest.trim_start().to_string(),
                None => format!("{prefix}{trimmed}"),
            }
        }
    }
}

/// Toggles the comment state of every line in the selection, each line
/// independently. Lines are rewritten from their trimmed text, matching the
/// editor command this mirrors.
pub fn toggle_comment_edits(
    document: &DoDocument,
    start_line: usize,
    end_line: usize,
    style: &CommentStyle,
) -> Vec<LineEdit> {
    let mut edits = Vec::new();
    if document.line_count() == 0 {
        return edits;
    }
    let last = document.line_count() - 1;
    for line in start_line..=end_line.min(last) {
        let text = document.line(line);
        let new_text = toggle_line(text.trim(), style);
        if new_text != text {
            edits.push(LineEdit { line, new_text });
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> DoDocument {
        DoDocument::new(text)
    }

    #[test]
    fn line_style_comments_and_uncomments() {
        let style = CommentStyle::from_setting("// ");
        let document = doc("display 1\n// display 2");
        let edits = toggle_comment_edits(&document, 0, 1, &style);
        assert_eq!(edits[0].new_text, "// display 1");
        assert_eq!(edits[1].new_text, "display 2");
    }

    #[test]
    fn star_style_round_trips() {
        let style = CommentStyle::from_setting("* ");
        let document = doc("summarize price");
        let once = document.apply(&toggle_comment_edits(&document, 0, 0, &style));
        assert_eq!(once.line(0), "* summarize price");
        let twice = once.apply(&toggle_comment_edits(&once, 0, 0, &style));
        assert_eq!(twice.line(0), "summarize price");
    }

    #[test]
    fn block_style_wraps_and_unwraps() {
        let style = CommentStyle::from_setting("/* ... */");
        let document = doc("regress y x");
        let once = document.apply(&toggle_comment_edits(&document, 0, 0, &style));
        assert_eq!(once.line(0), "/* regress y x */");
        let twice = once.apply(&toggle_comment_edits(&once, 0, 0, &style));
        assert_eq!(twice.line(0), "regress y x");
    }

    #[test]
    fn each_line_toggles_independently() {
        let style = CommentStyle::from_setting("// ");
        let document = doc("// a\nb");
        let edits = toggle_comment_edits(&document, 0, 1, &style);
        assert_eq!(edits[0].new_text, "a");
        assert_eq!(edits[1].new_text, "// b");
    }

    #[test]
    fn selection_is_clamped_to_the_document() {
        let style = CommentStyle::from_setting("// ");
        let document = doc("only");
        assert_eq!(toggle_comment_edits(&document, 0, 99, &style).len(), 1);
        assert!(toggle_comment_edits(&doc(""), 0, 5, &style).is_empty());
    }
}
