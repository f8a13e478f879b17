//! Heading numbering: dotted hierarchical counters, file synchronization
//! edits, and the heading-level command.
//!
//! The write/strip patterns here deliberately accept one *or* two leading
//! asterisks while the extraction pattern in `outline` demands exactly two.
//! The families overlap but are not the same; unifying them would change
//! behavior on single-asterisk heading-like lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{DoDocument, LineEdit};
use crate::outline::heading_records;

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*{1,2}\s*(#+)\s+(\d+(?:\.\d+)*)\s+(.*)$").unwrap());
static PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*{1,2}\s*(#+)\s+(.*)$").unwrap());
static LEVEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\*+\s*#+\s?)+").unwrap());

/// Per-depth sibling counters for dotted numbering.
///
/// Rebuilt from scratch for every pass; the outline display pass and the
/// file-write pass each run their own instance over the same heading order,
/// so both always agree.
#[derive(Debug, Default, Clone)]
pub struct NumberingCounters {
    counts: Vec<u32>,
}

impl NumberingCounters {
    /// Advances past a heading at `level` (1-based) and returns its dotted
    /// index. Slots deeper than `level` are zeroed, missing slots are
    /// zero-filled, then the slot at `level` is incremented.
    pub fn advance(&mut self, level: usize) -> String {
        if level == 0 {
            return String::new();
        }
        if self.counts.len() < level {
            self.counts.resize(level, 0);
        }
        for deeper in self.counts.iter_mut().skip(level) {
            *deeper = 0;
        }
        self.counts[level - 1] += 1;
        self.counts[..level]
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// What a synchronization pass does to heading lines on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingPolicy {
    /// Stamp the computed dotted index into each heading line.
    Write,
    /// Drop any existing dotted prefix, keeping hashes and title.
    Strip,
}

/// Resolves the two configuration flags into a pass policy: numbering is
/// written only when it is both shown and persisted, otherwise stripped.
pub fn sync_policy(show_numbering: bool, update_file: bool) -> NumberingPolicy {
    if show_numbering && update_file {
        NumberingPolicy::Write
    } else {
        NumberingPolicy::Strip
    }
}

/// Computes one synchronization pass over the document's headings.
///
/// Only lines the extractor recognizes as headings are touched, and a line
/// is rewritten only when its text actually changes, so a second write pass
/// over the same document yields zero edits. Headings the tolerant pattern
/// cannot re-match (no whitespace after the hashes) are skipped but still
/// advance the counters.
pub fn numbering_edits(document: &DoDocument, policy: NumberingPolicy) -> Vec<LineEdit> {
    let mut edits = Vec::new();
    match policy {
        NumberingPolicy::Write => {
            let mut counters = NumberingCounters::default();
            for heading in heading_records(document) {
                let number = counters.advance(heading.level);
                let text = document.line(heading.line);
                let new_text = if let Some(caps) = NUMBERED.captures(text) {
                    format!("**{} {} {}", &caps[1], number, &caps[3])
                } else if let Some(caps) = PLAIN.captures(text) {
                    format!("**{} {} {}", &caps[1], number, &caps[2])
                } else {
                    continue;
                };
                if new_text != text {
                    edits.push(LineEdit {
                        line: heading.line,
                        new_text,
                    });
                }
            }
        }
        NumberingPolicy::Strip => {
            for heading in heading_records(document) {
                let text = document.line(heading.line);
                let Some(caps) = NUMBERED.captures(text) else {
                    continue;
                };
                let new_text = format!("**{} {}", &caps[1], &caps[3]);
                if new_text != text {
                    edits.push(LineEdit {
                        line: heading.line,
                        new_text,
                    });
                }
            }
        }
    }
    edits
}

/// Rewrites each line of the selection to carry `level` hash marks (level 0
/// removes the heading prefix entirely). Existing heading prefixes are
/// stripped first, so re-leveling never stacks markers.
pub fn set_heading_level_edits(
    document: &DoDocument,
    start_line: usize,
    end_line: usize,
    level: usize,
) -> Vec<LineEdit> {
    let mut edits = Vec::new();
    if document.line_count() == 0 {
        return edits;
    }
    let last = document.line_count() - 1;
    for line in start_line..=end_line.min(last) {
        let text = document.line(line);
        let cleaned = LEVEL_PREFIX.replace(text, "");
        let new_text = if level == 0 {
            cleaned.into_owned()
        } else {
            format!("**{} {}", "#".repeat(level), cleaned)
        };
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
    fn counters_follow_document_order() {
        let mut counters = NumberingCounters::default();
        let labels: Vec<String> = [1, 2, 2, 1, 2]
            .into_iter()
            .map(|level| counters.advance(level))
            .collect();
        assert_eq!(labels, ["1", "1.1", "1.2", "2", "2.1"]);
    }

    #[test]
    fn counters_zero_fill_skipped_levels() {
        let mut counters = NumberingCounters::default();
        assert_eq!(counters.advance(1), "1");
        assert_eq!(counters.advance(3), "1.0.1");
    }

    #[test]
    fn policy_writes_only_when_shown_and_persisted() {
        assert_eq!(sync_policy(true, true), NumberingPolicy::Write);
        assert_eq!(sync_policy(false, true), NumberingPolicy::Strip);
        assert_eq!(sync_policy(true, false), NumberingPolicy::Strip);
        assert_eq!(sync_policy(false, false), NumberingPolicy::Strip);
    }

    #[test]
    fn write_stamps_dotted_numbers() {
        let document = doc("** # Data\nuse auto\n** ## Cleaning\n** # Models");
        let edits = numbering_edits(&document, NumberingPolicy::Write);
        let texts: Vec<&str> = edits.iter().map(|edit| edit.new_text.as_str()).collect();
        assert_eq!(texts, ["**# 1 Data", "**## 1.1 Cleaning", "**# 2 Models"]);
    }

    #[test]
    fn write_corrects_a_stale_number() {
        let document = doc("** # 7 Intro");
        let edits = numbering_edits(&document, NumberingPolicy::Write);
        assert_eq!(edits[0].new_text, "**# 1 Intro");
    }

    #[test]
    fn write_is_idempotent() {
        let document = doc("** # Data\n** ## Cleaning\n** ## Merging\n** # Models");
        let first = numbering_edits(&document, NumberingPolicy::Write);
        assert!(!first.is_empty());
        let written = document.apply(&first);
        assert!(numbering_edits(&written, NumberingPolicy::Write).is_empty());
    }

    #[test]
    fn write_then_strip_round_trips_titles() {
        let document = doc("**# Data\nuse auto\n**## Cleaning\n**# Models");
        let written = document.apply(&numbering_edits(&document, NumberingPolicy::Write));
        let stripped = written.apply(&numbering_edits(&written, NumberingPolicy::Strip));
        assert_eq!(stripped.text(), document.text());
    }

    #[test]
    fn strip_leaves_unnumbered_headings_alone() {
        let document = doc("**# Data\n**## 1.1 Cleaning");
        let edits = numbering_edits(&document, NumberingPolicy::Strip);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].line, 1);
        assert_eq!(edits[0].new_text, "**## Cleaning");
    }

    #[test]
    fn tolerant_mismatch_is_skipped_but_counted() {
        // "**#NoSpace" is a heading for the extractor but the write pattern
        // requires whitespace after the hashes, so the line is left alone
        // while the next heading still becomes number 2.
        let document = doc("**#NoSpace\n** # Second");
        let edits = numbering_edits(&document, NumberingPolicy::Write);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "**# 2 Second");
    }

    #[test]
    fn single_asterisk_lines_are_not_synchronized() {
        let document = doc("* # 1 comment, not a heading");
        assert!(numbering_edits(&document, NumberingPolicy::Write).is_empty());
        assert!(numbering_edits(&document, NumberingPolicy::Strip).is_empty());
    }

    #[test]
    fn empty_document_yields_zero_edits() {
        let document = doc("");
        assert!(numbering_edits(&document, NumberingPolicy::Write).is_empty());
        assert!(numbering_edits(&document, NumberingPolicy::Strip).is_empty());
    }

    #[test]
    fn set_level_prefixes_plain_lines() {
        let document = doc("summarize price\ntabulate rep78");
        let edits = set_heading_level_edits(&document, 0, 1, 2);
        assert_eq!(edits[0].new_text, "**## summarize price");
        assert_eq!(edits[1].new_text, "**## tabulate rep78");
    }

    #[test]
    fn set_level_replaces_an_existing_prefix() {
        let document = doc("** # Old title");
        let edits = set_heading_level_edits(&document, 0, 0, 3);
        assert_eq!(edits[0].new_text, "**### Old title");
    }

    #[test]
    fn level_zero_strips_stacked_prefixes() {
        let document = doc("** # ** ## stacked");
        let edits = set_heading_level_edits(&document, 0, 0, 0);
        assert_eq!(edits[0].new_text, "stacked");
    }

    #[test]
    fn set_level_clamps_to_document_end() {
        let document = doc("only line");
        let edits = set_heading_level_edits(&document, 0, 10, 1);
        assert_eq!(edits.len(), 1);
        assert!(set_heading_level_edits(&doc(""), 0, 3, 1).is_empty());
    }
}
