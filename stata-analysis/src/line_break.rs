//! Stata `///` line continuation.

use crate::document::DoDocument;

/// Replacement for the split line plus the cursor's landing position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationSplit {
    /// The line being replaced.
    pub line: usize,
    /// Two lines joined with `\n`: `<head> ///` and the indented tail.
    pub new_text: String,
    pub cursor_line: usize,
    pub cursor_col: usize,
}

/// Splits the line at `column` (code points) into a `///` continuation.
///
/// The first break in a statement indents the tail four extra spaces;
/// breaking an existing continuation keeps the current indent. Whitespace
/// around the cursor collapses into the single space before `///`.
pub fn split_with_continuation(
    document: &DoDocument,
    line: usize,
    column: usize,
) -> Option<ContinuationSplit> {
    if line >= document.line_count() {
        return None;
    }
    let text = document.line(line);
    let cps: Vec<char> = text.chars().collect();
    let split_at = column.min(cps.len());
    let before: String = cps[..split_at].iter().collect();
    let after: String = cps[split_at..].iter().collect();

    let base_indent: String = text.chars().take_while(|cp| cp.is_whitespace()).collect();

    // Already inside a continuation block when the nearest non-empty line
    // above ends with `///`.
    let mut first_break = true;
    for previous in (0..line).rev() {
        let trimmed = document.line(previous).trim();
        if trimmed.ends_with("///") {
            first_break = false;
            break;
        }
        if !trimmed.is_empty() {
            break;
        }
    }

    let indent = if first_break {
        format!("{base_indent}    ")
    } else {
        base_indent
    };
    let new_text = format!(
        "{} ///\n{}{}",
        before.trim_end(),
        indent,
        after.trim_start()
    );
    Some(ContinuationSplit {
        line,
        new_text,
        cursor_line: line + 1,
        cursor_col: indent.chars().count(),
    })
}
