//! Outline extraction for do-files.
//!
//! A do-file's structure comes from two token families: `** #` heading lines
//! (the hash count is the nesting level) and `program define NAME` … `end`
//! blocks. This module scans the document once, resolves the line range each
//! heading owns, and folds the flat record list into a nested symbol forest
//! for the editor's outline view.

use lsp_types::SymbolKind;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::DoDocument;
use crate::numbering::NumberingCounters;
use crate::separator::remove_separators;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*\s*(#+)\s*(.*)$").unwrap());
static NUMBER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*\s+(.*)$").unwrap());
static PROGRAM_DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*program\s+define\s+(\w+)").unwrap());
static PROGRAM_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*end\s*$").unwrap());

/// Inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Full span of a record's source line, columns in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleSpan {
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

/// A recognized `** #` heading line.
///
/// `title` has decorative separator runs and any stale dotted numbering
/// stripped; numbering is regenerated, never preserved. `full_span` is left
/// unresolved by the extractor and filled in by [`resolve_heading_spans`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    pub title: String,
    pub level: usize,
    pub line: usize,
    pub title_span: TitleSpan,
    pub full_span: Option<LineSpan>,
}

/// A `program define NAME` block.
///
/// The first `end` line after the define closes the block; without one it
/// runs to the last line. Nested define/end pairs are not balanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRecord {
    pub name: String,
    pub line: usize,
    pub title_span: TitleSpan,
    pub full_span: LineSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    Heading,
    Program,
}

impl OutlineKind {
    pub fn symbol_kind(self) -> SymbolKind {
        match self {
            OutlineKind::Heading => SymbolKind::METHOD,
            OutlineKind::Program => SymbolKind::PROPERTY,
        }
    }
}

/// One entry of the rendered outline forest.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    pub display_title: String,
    pub kind: OutlineKind,
    pub span: LineSpan,
    pub title_span: TitleSpan,
    pub children: Vec<OutlineNode>,
}

fn line_span_of(document: &DoDocument, line: usize) -> TitleSpan {
    TitleSpan {
        line,
        start_col: 0,
        end_col: document.line_len_utf16(line),
    }
}

/// Scans the document for heading lines, in source order.
///
/// The heading sentinel is exactly two asterisks: `*`-comment lines never
/// match. A heading with nothing after its hashes is accepted with an empty
/// title.
pub fn heading_records(document: &DoDocument) -> Vec<HeadingRecord> {
    let mut records = Vec::new();
    for line in 0..document.line_count() {
        let Some(caps) = HEADING.captures(document.line(line).trim()) else {
            continue;
        };
        let level = caps[1].len();
        let raw_title = caps[2].trim();
        let title = remove_separators(raw_title);
        let title = NUMBER_PREFIX
            .captures(&title)
            .map(|number| number[1].to_string())
            .unwrap_or(title);
        records.push(HeadingRecord {
            title,
            level,
            line,
            title_span: line_span_of(document, line),
            full_span: None,
        });
    }
    records
}

/// Scans the document for program blocks, in source order.
pub fn program_records(document: &DoDocument) -> Vec<ProgramRecord> {
    let line_count = document.line_count();
    let mut records = Vec::new();
    for line in 0..line_count {
        let Some(caps) = PROGRAM_DEFINE.captures(document.line(line)) else {
            continue;
        };
        let mut end_line = line_count.saturating_sub(1);
        for candidate in line + 1..line_count {
            if PROGRAM_END.is_match(document.line(candidate)) {
                end_line = candidate;
                break;
            }
        }
        records.push(ProgramRecord {
            name: caps[1].to_string(),
            line,
            title_span: line_span_of(document, line),
            full_span: LineSpan {
                start: line,
                end: end_line,
            },
        });
    }
    records
}

/// Assigns each heading the line range it owns: up to the line before the
/// next heading of equal-or-lower level, else to the last line.
pub fn resolve_heading_spans(headings: &mut [HeadingRecord], line_count: usize) {
    let last_line = line_count.saturating_sub(1);
    for index in 0..headings.len() {
        let mut end = last_line;
        for later in &headings[index + 1..] {
            if later.level <= headings[index].level {
                end = later.line.saturating_sub(1);
                break;
            }
        }
        headings[index].full_span = Some(LineSpan {
            start: headings[index].line,
            end,
        });
    }
}

enum Record {
    Heading(HeadingRecord),
    Program(ProgramRecord),
}

// Both inputs are already line-sorted; headings win same-line ties.
fn merge_records(headings: Vec<HeadingRecord>, programs: Vec<ProgramRecord>) -> Vec<Record> {
    let mut merged = Vec::with_capacity(headings.len() + programs.len());
    let mut headings = headings.into_iter().peekable();
    let mut programs = programs.into_iter().peekable();
    loop {
        let take_heading = match (headings.peek(), programs.peek()) {
            (Some(heading), Some(program)) => heading.line <= program.line,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_heading {
            merged.extend(headings.next().map(Record::Heading));
        } else {
            merged.extend(programs.next().map(Record::Program));
        }
    }
    merged
}

// Write-once node arena; children hold indices until materialization so the
// tree never needs shared references.
struct Slot {
    node: OutlineNode,
    children: Vec<usize>,
}

fn materialize(mut arena: Vec<Slot>, roots: Vec<usize>) -> Vec<OutlineNode> {
    // Children always sit at higher indices than their parent, so popping
    // from the back finishes every child before its parent is assembled.
    let mut finished: Vec<Option<OutlineNode>> = Vec::with_capacity(arena.len());
    finished.resize_with(arena.len(), || None);
    while let Some(slot) = arena.pop() {
        let index = arena.len();
        let mut node = slot.node;
        node.children = slot
            .children
            .iter()
            .filter_map(|&child| finished.get_mut(child).and_then(Option::take))
            .collect();
        finished[index] = Some(node);
    }
    roots
        .into_iter()
        .filter_map(|root| finished.get_mut(root).and_then(Option::take))
        .collect()
}

/// Builds the outline forest for the document.
///
/// With `show_numbering`, heading display titles carry their dotted
/// hierarchical index (`2.3.1`). Program nodes are attached as leaves of the
/// innermost open heading and never receive numbering. The forest is rebuilt
/// from scratch on every call; nothing is cached between invocations.
pub fn document_outline(document: &DoDocument, show_numbering: bool) -> Vec<OutlineNode> {
    let mut headings = heading_records(document);
    resolve_heading_spans(&mut headings, document.line_count());
    let programs = program_records(document);

    let mut arena: Vec<Slot> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    // Open ancestor chain, shallowest at the bottom.
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut counters = NumberingCounters::default();

    for record in merge_records(headings, programs) {
        let (level, node) = match record {
            Record::Heading(heading) => {
                let display_title = if show_numbering {
                    format!("{} {}", counters.advance(heading.level), heading.title)
                } else {
                    heading.title.clone()
                };
                let span = heading.full_span.unwrap_or(LineSpan {
                    start: heading.line,
                    end: heading.line,
                });
                (
                    Some(heading.level),
                    OutlineNode {
                        display_title,
                        kind: OutlineKind::Heading,
                        span,
                        title_span: heading.title_span,
                        children: Vec::new(),
                    },
                )
            }
            Record::Program(program) => (
                None,
                OutlineNode {
                    display_title: program.name,
                    kind: OutlineKind::Program,
                    span: program.full_span,
                    title_span: program.title_span,
                    children: Vec::new(),
                },
            ),
        };

        if let Some(level) = level {
            // A heading closes every open ancestor at its own depth or deeper.
            while stack.last().is_some_and(|&(open, _)| open >= level) {
                stack.pop();
            }
        }

        let index = arena.len();
        arena.push(Slot {
            node,
            children: Vec::new(),
        });
        match stack.last() {
            Some(&(_, parent)) => arena[parent].children.push(index),
            None => roots.push(index),
        }
        if let Some(level) = level {
            stack.push((level, index));
        }
    }

    materialize(arena, roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> DoDocument {
        DoDocument::new(text)
    }

    #[test]
    fn recognizes_heading_levels() {
        let document = doc("** # Data\n** ## Cleaning\n* not a heading\n// also not");
        let records = heading_records(&document);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Data");
        assert_eq!(records[0].level, 1);
        assert_eq!(records[1].title, "Cleaning");
        assert_eq!(records[1].level, 2);
    }

    #[test]
    fn heading_match_trims_leading_whitespace() {
        let document = doc("    ** # Indented");
        let records = heading_records(&document);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Indented");
    }

    #[test]
    fn empty_title_is_accepted() {
        let document = doc("** ##");
        let records = heading_records(&document);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].level, 2);
    }

    #[test]
    fn strips_decorative_separators_from_title() {
        let document = doc("** ## ==== Results ====");
        let records = heading_records(&document);
        assert_eq!(records[0].title, "Results");
    }

    #[test]
    fn strips_stale_numbering_prefix() {
        let document = doc("** ## 3.1 Robustness checks");
        let records = heading_records(&document);
        assert_eq!(records[0].title, "Robustness checks");
    }

    #[test]
    fn program_block_closes_on_first_end() {
        let document = doc("program define clean_data\n    drop if missing(id)\nend\n\nend");
        let records = program_records(&document);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "clean_data");
        assert_eq!(records[0].full_span, LineSpan { start: 0, end: 2 });
    }

    #[test]
    fn unterminated_program_runs_to_last_line() {
        let mut text = String::new();
        for line in 0..20 {
            if line == 5 {
                text.push_str("program define orphan\n");
            } else {
                text.push_str("display 1\n");
            }
        }
        let document = doc(&text);
        let records = program_records(&document);
        assert_eq!(records[0].full_span, LineSpan { start: 5, end: 19 });
    }

    #[test]
    fn program_tokens_are_case_insensitive() {
        let document = doc("  Program Define Foo\n  END  ");
        let records = program_records(&document);
        assert_eq!(records[0].name, "Foo");
        assert_eq!(records[0].full_span, LineSpan { start: 0, end: 1 });
    }

    #[test]
    fn heading_span_ends_before_equal_or_lower_level() {
        let document = doc("** # A\nx\n** ## B\nx\n** # C\nx");
        let mut records = heading_records(&document);
        resolve_heading_spans(&mut records, document.line_count());
        assert_eq!(records[0].full_span, Some(LineSpan { start: 0, end: 3 }));
        assert_eq!(records[1].full_span, Some(LineSpan { start: 2, end: 3 }));
        assert_eq!(records[2].full_span, Some(LineSpan { start: 4, end: 5 }));
    }

    #[test]
    fn numbering_sequence_matches_document_order() {
        let document = doc("** # a\n** ## b\n** ## c\n** # d\n** ## e");
        let outline = document_outline(&document, true);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].display_title, "1 a");
        assert_eq!(outline[0].children[0].display_title, "1.1 b");
        assert_eq!(outline[0].children[1].display_title, "1.2 c");
        assert_eq!(outline[1].display_title, "2 d");
        assert_eq!(outline[1].children[0].display_title, "2.1 e");
    }

    #[test]
    fn numbering_disabled_leaves_titles_bare() {
        let document = doc("** # a\n** ## b");
        let outline = document_outline(&document, false);
        assert_eq!(outline[0].display_title, "a");
        assert_eq!(outline[0].children[0].display_title, "b");
    }

    #[test]
    fn out_of_order_levels_become_roots() {
        let document = doc("** ### deep first\n** # shallow");
        let outline = document_outline(&document, false);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].display_title, "deep first");
        assert_eq!(outline[1].display_title, "shallow");
    }

    #[test]
    fn program_attaches_to_innermost_heading() {
        let document = doc("** # Setup\n** ## Helpers\nprogram define f\nend\n** # Next");
        let outline = document_outline(&document, false);
        let helpers = &outline[0].children[0];
        assert_eq!(helpers.display_title, "Helpers");
        assert_eq!(helpers.children.len(), 1);
        assert_eq!(helpers.children[0].display_title, "f");
        assert_eq!(helpers.children[0].kind, OutlineKind::Program);
    }

    #[test]
    fn program_before_any_heading_is_a_root() {
        let document = doc("program define f\nend\n** # A");
        let outline = document_outline(&document, false);
        assert_eq!(outline[0].display_title, "f");
        assert_eq!(outline[1].display_title, "A");
    }

    #[test]
    fn empty_document_yields_empty_forest() {
        let document = doc("");
        assert!(document_outline(&document, true).is_empty());
    }

    fn check_nesting(node: &OutlineNode) {
        let mut previous_end: Option<usize> = None;
        for child in &node.children {
            assert!(
                node.span.contains(child.title_span.line),
                "child at line {} escapes parent span {:?}",
                child.title_span.line,
                node.span
            );
            if let Some(end) = previous_end {
                assert!(child.span.start > end, "sibling spans overlap");
            }
            previous_end = Some(child.span.end);
            check_nesting(child);
        }
    }

    #[test]
    fn sample_fixture_outline_shape() {
        let outline = document_outline(&crate::test_support::sample_document(), true);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].display_title, "1 Setup");
        let children: Vec<&str> = outline[0]
            .children
            .iter()
            .map(|child| child.display_title.as_str())
            .collect();
        assert_eq!(children, ["1.1 Data import", "1.2 Cleaning"]);
        assert_eq!(
            outline[0].children[0].children[0].display_title,
            "check_sample"
        );
        assert_eq!(outline[1].display_title, "2 Analysis");
    }

    #[test]
    fn forest_upholds_nesting_invariant() {
        let document = doc(
            "** # One\nx\n** ## One-A\nprogram define p\nend\n** ## One-B\nx\n** # Two\n** ### Two-deep\nx",
        );
        for node in document_outline(&document, true) {
            check_nesting(&node);
        }
    }
}
