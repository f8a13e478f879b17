//! Language Server Protocol (LSP) implementation for Stata do-files
//!
//! This crate provides language server capabilities for `.do` scripts,
//! enabling outline navigation and editing commands in any LSP-compatible
//! editor (VSCode, Neovim, Emacs, Sublime, etc.).
//!
//! # Feature Set
//!
//! Do-files are scripts organized by comment conventions rather than a
//! type system, so the server focuses on structure and text transforms:
//!
//! 1. Document Symbols (textDocument/documentSymbol):
//!    - Hierarchical outline from `** #` heading lines and
//!      `program define` blocks
//!    - Optional dotted numbering (1., 1.1., 2.3.1, …) in display titles
//!    - Doubles as the trigger for numbering synchronization: when the
//!      client persists numbering, heading lines are rewritten through a
//!      single workspace/applyEdit per pass
//! 2. Folding Ranges (textDocument/foldingRange):
//!    - Fold heading sections and program blocks
//! 3. Commands (workspace/executeCommand):
//!    - stata.setHeadingLevel, stata.toggleComment,
//!      stata.insertSeparator, stata.insertLineBreak — each returns a
//!      WorkspaceEdit computed by the analysis layer
//!
//! # Architecture
//!
//! LSP Layer (tower-lsp):
//! - JSON-RPC transport, handshaking, request routing
//!
//! Server Layer (this crate):
//! - Implements the LanguageServer trait over a full-text document
//!   store; every change replaces the whole snapshot, nothing is
//!   incremental
//! - Thin: resolves documents and configuration, then delegates to
//!   the feature layer; tests assert the right things are called
//!
//! Feature Layer (stata-analysis):
//! - Stateless line-scanning transforms with the dense unit tests
//!
//! # Error Handling and Robustness
//!
//! The analysis is total over arbitrary text: malformed headings,
//! unterminated program blocks, and out-of-order levels degrade instead
//! of failing, and production paths avoid `unwrap()`/`expect()`. A
//! rejected workspace/applyEdit is logged to the client and the pass is
//! discarded; there is no retry and no partial rollback beyond what the
//! edit transaction guarantees. The proptest suite fuzzes commands and
//! document text to keep the server panic-free under garbage input.
//!
//! # Usage
//!
//! Library:
//!
//! ```rust,ignore
//! use stata_lsp::StataLanguageServer;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (service, socket) = LspService::new(StataLanguageServer::new);
//!     Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
//!         .serve(service)
//!         .await;
//! }
//! ```
//!
//! Binary:
//!
//! ```text
//! $ stata-lsp
//! Starts the language server on stdin/stdout for editor integration.
//!
//! $ stata-lsp outline analysis.do
//! Prints the outline forest of a do-file as JSON.
//! ```

pub mod features;
pub mod server;

pub use server::StataLanguageServer;
