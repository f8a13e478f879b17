//! Foldable regions derived from the outline records.

use lsp_types::FoldingRangeKind;

use crate::document::DoDocument;
use crate::outline::{heading_records, program_records, resolve_heading_spans};

#[derive(Debug, Clone, PartialEq)]
pub struct DoFoldingRange {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: Option<FoldingRangeKind>,
}

/// Collects region folds for every multi-line heading section and program
/// block, ordered by start line.
pub fn folding_ranges(document: &DoDocument) -> Vec<DoFoldingRange> {
    let mut headings = heading_records(document);
    resolve_heading_spans(&mut headings, document.line_count());

    let mut ranges = Vec::new();
    for heading in &headings {
        let Some(span) = heading.full_span else {
            continue;
        };
        if span.start < span.end {
            ranges.push(DoFoldingRange {
                start_line: span.start as u32,
                end_line: span.end as u32,
                kind: Some(FoldingRangeKind::Region),
            });
        }
    }
    for program in program_records(document) {
        if program.full_span.start < program.full_span.end {
            ranges.push(DoFoldingRange {
                start_line: program.full_span.start as u32,
                end_line: program.full_span.end as u32,
                kind: Some(FoldingRangeKind::Region),
            });
        }
    }
    ranges.sort_by_key(|range| (range.start_line, range.end_line));
    ranges
}
