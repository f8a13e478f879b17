//! Document analysis for Stata do-files
//!
//! This crate provides the editor-facing analysis for `.do` scripts:
//! outline extraction, heading numbering, and the text transforms behind
//! the editing commands (comment toggling, separator lines, `///`
//! continuations).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `document`: immutable line-indexed buffer and the full-line edit shape
//! - `outline`: heading/program recognition, range resolution, and the
//!   nested symbol forest
//! - `numbering`: dotted hierarchical counters, file synchronization edits,
//!   and the heading-level command
//! - `folding_ranges`: foldable regions from outline spans
//! - `separator`: decorative separator detection, removal, and insertion
//! - `comment`: per-line comment toggling
//! - `line_break`: `///` continuation splitting
//!
//! # Design Principles
//!
//! - **Stateless**: every function re-scans an immutable document snapshot;
//!   nothing is cached between invocations
//! - **Total**: arbitrary input degrades (empty titles, unterminated
//!   programs, out-of-order levels) instead of failing — no panics, no
//!   error kinds
//! - **Reusable**: not tied to the LSP transport; the protocol crate and
//!   the CLI both consume the same functions
//!
//! # Usage
//!
//! ```rust
//! use stata_analysis::document::DoDocument;
//! use stata_analysis::numbering::{numbering_edits, NumberingPolicy};
//! use stata_analysis::outline::document_outline;
//!
//! let document = DoDocument::new("** # Data\nuse auto\n** ## Cleaning");
//! let outline = document_outline(&document, true);
//! assert_eq!(outline[0].display_title, "1 Data");
//!
//! let edits = numbering_edits(&document, NumberingPolicy::Write);
//! assert_eq!(edits.len(), 2);
//! ```

pub mod comment;
pub mod document;
pub mod folding_ranges;
pub mod line_break;
pub mod numbering;
pub mod outline;
pub mod separator;

// Test support (available in tests and as dev-dependency)
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
