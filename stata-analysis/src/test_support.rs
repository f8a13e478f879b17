use crate::document::DoDocument;

/// A small but representative do-file: nested headings (one decorated, one
/// carrying stale numbering), a program block, and ordinary commands.
pub const SAMPLE_SOURCE: &str = "\
** # ==== Setup ====
clear all
set more off

** ## Data import
use \"auto.dta\", clear

program define check_sample
    assert _N > 0
end

** ## 9.9 Cleaning
drop if missing(price)

** # Analysis
summarize price mpg

** ## Models
regress price mpg weight
";

pub fn sample_document() -> DoDocument {
    DoDocument::new(SAMPLE_SOURCE)
}
