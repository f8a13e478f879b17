//! Separator lines and decorative title runs.
//!
//! Separators are `** ` comment lines whose body repeats a short unit
//! (`** ==========`, `** -*-*-*-`). Everything here works on code points,
//! not bytes, so emoji units survive slicing and truncation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::DoDocument;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*\s*(#+)\s*(.*)$").unwrap());
static BRACKETED_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([=\-*#%]+)\s+(.+?)\s+[=\-*#%]+$").unwrap());

/// Strips decorative separator runs bracketing a heading title.
///
/// A run is a unit of 1–6 code points repeated at least three times on each
/// side of non-empty inner text (`==== text ====`). Titles shorter than
/// seven code points, or without such bracketing, come back unchanged.
pub fn remove_separators(title: &str) -> String {
    let cps: Vec<char> = title.chars().collect();
    let len = cps.len();
    if len < 7 {
        return title.to_string();
    }

    for unit_len in 1..=6 {
        let unit = &cps[..unit_len];

        let mut left_reps = 0;
        let mut pos = 0;
        while pos + unit_len <= len && cps[pos..pos + unit_len] == *unit {
            left_reps += 1;
            pos += unit_len;
        }
        if left_reps < 3 {
            continue;
        }

        let mut right_reps = 0;
        let mut right_pos = len;
        while right_pos >= unit_len
            && right_pos - unit_len >= left_reps * unit_len
            && cps[right_pos - unit_len..right_pos] == *unit
        {
            right_reps += 1;
            right_pos -= unit_len;
        }

        if right_reps >= 3 && right_pos > left_reps * unit_len {
            let middle: String = cps[left_reps * unit_len..right_pos].iter().collect();
            let middle = middle.trim();
            if !middle.is_empty() {
                return middle.to_string();
            }
        }
    }

    // Fallback for shorter symmetric decorations: a prefix that is also the
    // suffix, with inner text that does not repeat it.
    let trimmed: Vec<char> = title.trim().chars().collect();
    for unit_len in 1..=trimmed.len() / 3 {
        let unit: String = trimmed[..unit_len].iter().collect();
        let tail: String = trimmed[trimmed.len() - unit_len..].iter().collect();
        if unit == tail && trimmed.len() > 2 * unit_len {
            let middle: String = trimmed[unit_len..trimmed.len() - unit_len].iter().collect();
            let middle = middle.trim();
            if !middle.is_empty() && !middle.contains(&unit) {
                return middle.to_string();
            }
        }
    }

    title.to_string()
}

/// True for `** ` lines whose body is a repeated 1–6 code-point unit of
/// total length ≥ 3.
pub fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(body) = trimmed.strip_prefix("** ") else {
        return false;
    };
    let cps: Vec<char> = body.chars().collect();
    if cps.len() < 3 {
        return false;
    }
    (1..=cps.len().min(6)).any(|unit_len| {
        cps.iter()
            .enumerate()
            .all(|(index, cp)| *cp == cps[index % unit_len])
    })
}

/// Repeats `unit` code-point-wise, truncated to exactly `length` points.
pub fn build_separator_segment(unit: &str, length: usize) -> String {
    if unit.is_empty() || length == 0 {
        return String::new();
    }
    unit.chars().cycle().take(length).collect()
}

pub fn has_non_ascii_code_point(text: &str) -> bool {
    text.chars().any(|cp| cp as u32 > 0x7f)
}

/// Outcome of a separator-insertion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeparatorAction {
    /// Re-flow the selected heading line to the configured width.
    ReplaceLine { line: usize, new_text: String },
    /// Insert a standalone separator line before `line` (which may be one
    /// past the last line).
    InsertLine { line: usize, text: String },
    /// A separator already sits at or around the cursor; nothing to do.
    AlreadyPresent,
    /// The heading title leaves fewer than four columns for the run.
    LineTooLong,
}

/// Plans a separator insertion at the cursor.
///
/// A non-empty single-line selection on a heading re-flows that heading to
/// `**<hashes> <run> <title> <run>`; any existing bracketing run is removed
/// from the title first. Otherwise a standalone `** <run>` line is inserted,
/// skipped when the neighborhood already carries one. Wide (non-ASCII) units
/// get two thirds of the configured width, floor ten.
pub fn plan_separator(
    document: &DoDocument,
    start_line: usize,
    end_line: usize,
    has_selection: bool,
    unit: &str,
    total_length: usize,
) -> SeparatorAction {
    let effective_length = if has_non_ascii_code_point(unit) {
        (total_length * 2 / 3).max(10)
    } else {
        total_length
    };

    if has_selection && start_line == end_line {
        let text = document.line(start_line);
        if let Some(caps) = HEADING.captures(text.trim()) {
            let hashes = &caps[1];
            let mut title = caps[2].trim().to_string();
            if let Some(bracketed) = BRACKETED_TITLE.captures(&title) {
                title = bracketed[2].trim().to_string();
            }

            let prefix_length = 2 + hashes.len() + 1;
            let title_length = title.chars().count();
            let Some(remaining) =
                effective_length.checked_sub(prefix_length + title_length)
            else {
                return SeparatorAction::LineTooLong;
            };
            if remaining < 4 {
                return SeparatorAction::LineTooLong;
            }

            let run_total = remaining - 2;
            let left_len = run_total / 2;
            let right_len = run_total - left_len;
            let left = build_separator_segment(unit, left_len);
            let right = build_separator_segment(unit, right_len);
            return SeparatorAction::ReplaceLine {
                line: start_line,
                new_text: format!("**{hashes} {left} {title} {right}"),
            };
        }
    }

    let body = build_separator_segment(unit, effective_length.saturating_sub(3));
    let separator_line = format!("** {body}");

    let mut target = start_line;
    let current = document.line(target);
    let current_empty = current.trim().is_empty();
    let current_is_separator = is_separator_line(current);
    let previous_is_separator = target > 0 && is_separator_line(document.line(target - 1));
    let next_is_separator =
        target + 1 < document.line_count() && is_separator_line(document.line(target + 1));

    if current_is_separator || (previous_is_separator && next_is_separator) {
        return SeparatorAction::AlreadyPresent;
    }
    if !current_empty && previous_is_separator {
        target += 1;
    }

    SeparatorAction::InsertLine {
        line: target.min(document.line_count()),
        text: separator_line,
    }
}
