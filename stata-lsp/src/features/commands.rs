//! Command names and `WorkspaceEdit` construction.
//!
//! The analysis crate hands back full-line replacements; this module turns
//! them into the protocol's edit shapes and parses `executeCommand`
//! argument arrays.

use std::collections::HashMap;

use serde_json::Value;
use stata_analysis::document::{DoDocument, LineEdit};
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{Position, Range, TextEdit, Url, WorkspaceEdit};

pub const COMMAND_SET_HEADING_LEVEL: &str = "stata.setHeadingLevel";
pub const COMMAND_TOGGLE_COMMENT: &str = "stata.toggleComment";
pub const COMMAND_INSERT_SEPARATOR: &str = "stata.insertSeparator";
pub const COMMAND_INSERT_LINE_BREAK: &str = "stata.insertLineBreak";

fn full_line_range(document: &DoDocument, line: usize) -> Range {
    Range {
        start: Position::new(line as u32, 0),
        end: Position::new(line as u32, document.line_len_utf16(line) as u32),
    }
}

fn single_uri_edit(uri: &Url, edits: Vec<TextEdit>) -> WorkspaceEdit {
    WorkspaceEdit {
        changes: Some(HashMap::from([(uri.clone(), edits)])),
        ..Default::default()
    }
}

/// One atomic multi-range replace covering a whole synchronization or
/// toggle pass. The replacement text may contain `\n` to split a line.
pub fn replace_lines(uri: &Url, document: &DoDocument, edits: &[LineEdit]) -> WorkspaceEdit {
    let text_edits = edits
        .iter()
        .map(|edit| TextEdit {
            range: full_line_range(document, edit.line),
            new_text: edit.new_text.clone(),
        })
        .collect();
    single_uri_edit(uri, text_edits)
}

/// Inserts `text` as a new line before `line`. A target at or past the end
/// of the document appends below the last line instead.
pub fn insert_line(uri: &Url, document: &DoDocument, line: usize, text: &str) -> WorkspaceEdit {
    let text_edit = if line < document.line_count() {
        let at = Position::new(line as u32, 0);
        TextEdit {
            range: Range { start: at, end: at },
            new_text: format!("{text}\n"),
        }
    } else if document.line_count() == 0 {
        let at = Position::new(0, 0);
        TextEdit {
            range: Range { start: at, end: at },
            new_text: format!("{text}\n"),
        }
    } else {
        let last = document.line_count() - 1;
        let at = Position::new(last as u32, document.line_len_utf16(last) as u32);
        TextEdit {
            range: Range { start: at, end: at },
            new_text: format!("\n{text}"),
        }
    };
    single_uri_edit(uri, vec![text_edit])
}

pub fn required_str<'a>(arguments: &'a [Value], index: usize, name: &str) -> Result<&'a str> {
    arguments
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_params(format!("Missing '{name}' argument")))
}

pub fn required_usize(arguments: &[Value], index: usize, name: &str) -> Result<usize> {
    arguments
        .get(index)
        .and_then(Value::as_u64)
        .map(|value| value as usize)
        .ok_or_else(|| Error::invalid_params(format!("Missing '{name}' argument")))
}

pub fn optional_bool(arguments: &[Value], index: usize) -> bool {
    arguments
        .get(index)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn optional_str<'a>(arguments: &'a [Value], index: usize, default: &'a str) -> &'a str {
    arguments
        .get(index)
        .and_then(Value::as_str)
        .unwrap_or(default)
}
