// LSP-specific features (command payloads, WorkspaceEdit construction)
pub mod commands;

// Re-export analysis features from stata-analysis
pub use stata_analysis::{comment, folding_ranges, line_break, numbering, outline, separator};
