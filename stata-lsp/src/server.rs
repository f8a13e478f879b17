//! Main language server implementation

use std::collections::HashMap;
use std::sync::Arc;

use crate::features::commands::{
    self, insert_line, optional_bool, optional_str, replace_lines, required_str, required_usize,
};
use serde_json::{json, Value};
use stata_analysis::comment::{toggle_comment_edits, CommentStyle};
use stata_analysis::document::{DoDocument, LineEdit};
use stata_analysis::folding_ranges::{folding_ranges as collect_folding_ranges, DoFoldingRange};
use stata_analysis::line_break::split_with_continuation;
use stata_analysis::numbering::{
    numbering_edits, set_heading_level_edits, sync_policy, NumberingPolicy,
};
use stata_analysis::outline::{document_outline, OutlineNode};
use stata_analysis::separator::{plan_separator, SeparatorAction};
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{
    ApplyWorkspaceEditResponse, DidChangeConfigurationParams, DocumentSymbol, DocumentSymbolParams,
    DocumentSymbolResponse, ExecuteCommandOptions, ExecuteCommandParams, FoldingRange,
    FoldingRangeParams, FoldingRangeProviderCapability, InitializeParams, InitializeResult,
    InitializedParams, MessageType, OneOf, Position, Range, ServerCapabilities, ServerInfo,
    TextDocumentItem, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
    WorkDoneProgressOptions, WorkspaceEdit,
};
use tower_lsp::Client;

/// The slice of the LSP client the server actually talks back through,
/// abstracted so tests can record instead of speak JSON-RPC.
#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn apply_edit(&self, edit: WorkspaceEdit) -> Result<ApplyWorkspaceEditResponse>;
    async fn show_message(&self, typ: MessageType, message: String);
    async fn log_message(&self, typ: MessageType, message: String);
}

#[async_trait]
impl LspClient for Client {
    async fn apply_edit(&self, edit: WorkspaceEdit) -> Result<ApplyWorkspaceEditResponse> {
        self.apply_edit(edit).await
    }

    async fn show_message(&self, typ: MessageType, message: String) {
        self.show_message(typ, message).await;
    }

    async fn log_message(&self, typ: MessageType, message: String) {
        self.log_message(typ, message).await;
    }
}

pub trait FeatureProvider: Send + Sync + 'static {
    fn document_outline(&self, document: &DoDocument, show_numbering: bool) -> Vec<OutlineNode>;
    fn folding_ranges(&self, document: &DoDocument) -> Vec<DoFoldingRange>;
    fn numbering_edits(&self, document: &DoDocument, policy: NumberingPolicy) -> Vec<LineEdit>;
}

#[derive(Default)]
pub struct DefaultFeatureProvider;

impl DefaultFeatureProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureProvider for DefaultFeatureProvider {
    fn document_outline(&self, document: &DoDocument, show_numbering: bool) -> Vec<OutlineNode> {
        document_outline(document, show_numbering)
    }

    fn folding_ranges(&self, document: &DoDocument) -> Vec<DoFoldingRange> {
        collect_folding_ranges(document)
    }

    fn numbering_edits(&self, document: &DoDocument, policy: NumberingPolicy) -> Vec<LineEdit> {
        numbering_edits(document, policy)
    }
}

#[derive(Default)]
struct DocumentStore {
    entries: RwLock<HashMap<Url, Arc<DoDocument>>>,
}

impl DocumentStore {
    // Parsing is total for do-files, so every upsert yields a document.
    async fn upsert(&self, uri: Url, text: &str) -> Arc<DoDocument> {
        let document = Arc::new(DoDocument::new(text));
        self.entries.write().await.insert(uri, Arc::clone(&document));
        document
    }

    async fn get(&self, uri: &Url) -> Option<Arc<DoDocument>> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(uri);
    }
}

/// Settings mirrored from the client, refreshed on every
/// `workspace/didChangeConfiguration`.
#[derive(Debug, Clone)]
pub struct StataConfiguration {
    /// Show dotted numbering in the outline.
    pub numbering_show: bool,
    /// Persist numbering into the file text (strip when off).
    pub numbering_add: bool,
    pub comment_style: String,
    pub separator_length: usize,
}

impl Default for StataConfiguration {
    fn default() -> Self {
        Self {
            numbering_show: true,
            numbering_add: false,
            comment_style: "// ".to_string(),
            separator_length: 60,
        }
    }
}

pub struct StataLanguageServer<C = Client, P = DefaultFeatureProvider> {
    client: C,
    documents: DocumentStore,
    features: Arc<P>,
    config: RwLock<StataConfiguration>,
}

impl StataLanguageServer<Client, DefaultFeatureProvider> {
    pub fn new(client: Client) -> Self {
        Self::with_features(client, Arc::new(DefaultFeatureProvider::new()))
    }
}

impl<C, P> StataLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    pub fn with_features(client: C, features: Arc<P>) -> Self {
        Self {
            client,
            documents: DocumentStore::default(),
            features,
            config: RwLock::new(StataConfiguration::default()),
        }
    }

    async fn document(&self, uri: &Url) -> Option<Arc<DoDocument>> {
        self.documents.get(uri).await
    }

    /// One numbering pass against the file: compute the edits for the
    /// current policy, submit them as a single applyEdit, and log a rejected
    /// or failed apply instead of retrying.
    async fn synchronize_numbering(&self, uri: &Url, document: &DoDocument) {
        let policy = {
            let config = self.config.read().await;
            sync_policy(config.numbering_show, config.numbering_add)
        };
        let edits = self.features.numbering_edits(document, policy);
        if edits.is_empty() {
            return;
        }
        let workspace_edit = replace_lines(uri, document, &edits);
        match self.client.apply_edit(workspace_edit).await {
            Ok(ApplyWorkspaceEditResponse { applied: true, .. }) => {}
            Ok(response) => {
                let reason = response
                    .failure_reason
                    .unwrap_or_else(|| "edit rejected by client".to_string());
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("numbering synchronization discarded: {reason}"),
                    )
                    .await;
            }
            Err(error) => {
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("numbering synchronization failed: {error}"),
                    )
                    .await;
            }
        }
    }
}

fn line_end_position(document: &DoDocument, line: usize) -> Position {
    Position::new(line as u32, document.line_len_utf16(line) as u32)
}

#[allow(deprecated)]
fn to_document_symbol(document: &DoDocument, node: &OutlineNode) -> DocumentSymbol {
    DocumentSymbol {
        name: node.display_title.clone(),
        detail: None,
        kind: node.kind.symbol_kind(),
        deprecated: None,
        range: Range {
            start: Position::new(node.span.start as u32, 0),
            end: line_end_position(document, node.span.end),
        },
        selection_range: Range {
            start: Position::new(node.title_span.line as u32, node.title_span.start_col as u32),
            end: Position::new(node.title_span.line as u32, node.title_span.end_col as u32),
        },
        children: if node.children.is_empty() {
            None
        } else {
            Some(
                node.children
                    .iter()
                    .map(|child| to_document_symbol(document, child))
                    .collect(),
            )
        },
        tags: None,
    }
}

fn to_lsp_folding_range(range: &DoFoldingRange) -> FoldingRange {
    FoldingRange {
        start_line: range.start_line,
        start_character: None,
        end_line: range.end_line,
        end_character: None,
        kind: range.kind.clone(),
        collapsed_text: None,
    }
}

// A separator unit must be one printable code point; everything else is a
// user mistake to report, not an error to fail on.
fn validate_separator_unit(unit: &str) -> std::result::Result<(), &'static str> {
    let mut points = unit.chars();
    let Some(first) = points.next() else {
        return Err("Please enter exactly one character.");
    };
    if points.next().is_some() {
        return Err("Please enter exactly one character.");
    }
    if first.is_control() {
        return Err("Control characters are not supported.");
    }
    Ok(())
}

#[async_trait]
impl<C, P> tower_lsp::LanguageServer for StataLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            document_symbol_provider: Some(OneOf::Left(true)),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: vec![
                    commands::COMMAND_SET_HEADING_LEVEL.to_string(),
                    commands::COMMAND_TOGGLE_COMMENT.to_string(),
                    commands::COMMAND_INSERT_SEPARATOR.to_string(),
                    commands::COMMAND_INSERT_LINE_BREAK.to_string(),
                ],
                work_done_progress_options: WorkDoneProgressOptions::default(),
            }),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "stata-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {}

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: tower_lsp::lsp_types::DidOpenTextDocumentParams) {
        let TextDocumentItem { uri, text, .. } = params.text_document;
        self.documents.upsert(uri, &text).await;
    }

    async fn did_change(&self, params: tower_lsp::lsp_types::DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .upsert(params.text_document.uri, &change.text)
                .await;
        }
    }

    async fn did_close(&self, params: tower_lsp::lsp_types::DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = params.settings;
        let mut config = self.config.write().await;

        if let Some(value) = settings.get("numberingShow").and_then(Value::as_bool) {
            config.numbering_show = value;
        }
        if let Some(value) = settings.get("numberingAdd").and_then(Value::as_bool) {
            config.numbering_add = value;
        }
        if let Some(value) = settings.get("commentStyle").and_then(Value::as_str) {
            config.comment_style = value.to_string();
        }
        if let Some(value) = settings.get("separatorLength").and_then(Value::as_u64) {
            // Anything below the workable minimum falls back to the default.
            config.separator_length = if value < 10 { 60 } else { value as usize };
        }
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Some(document) = self.document(&uri).await else {
            return Ok(None);
        };
        let show_numbering = self.config.read().await.numbering_show;
        let outline = self.features.document_outline(&document, show_numbering);
        let converted: Vec<DocumentSymbol> = outline
            .iter()
            .map(|node| to_document_symbol(&document, node))
            .collect();

        // The outline pass doubles as the file synchronization trigger.
        self.synchronize_numbering(&uri, &document).await;

        Ok(Some(DocumentSymbolResponse::Nested(converted)))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        if let Some(document) = self.document(&params.text_document.uri).await {
            let ranges = self.features.folding_ranges(&document);
            Ok(Some(ranges.iter().map(to_lsp_folding_range).collect()))
        } else {
            Ok(None)
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let arguments = params.arguments;
        match params.command.as_str() {
            commands::COMMAND_SET_HEADING_LEVEL => {
                let uri = Url::parse(required_str(&arguments, 0, "uri")?)
                    .map_err(|_| Error::invalid_params("Invalid 'uri' argument"))?;
                let level = required_usize(&arguments, 1, "level")?;
                let start_line = required_usize(&arguments, 2, "startLine")?;
                let end_line = required_usize(&arguments, 3, "endLine")?;

                let Some(document) = self.document(&uri).await else {
                    return Ok(None);
                };
                let edits = set_heading_level_edits(&document, start_line, end_line, level);
                if edits.is_empty() {
                    return Ok(None);
                }
                let workspace_edit = replace_lines(&uri, &document, &edits);
                Ok(Some(
                    serde_json::to_value(workspace_edit).map_err(|_| Error::internal_error())?,
                ))
            }
            commands::COMMAND_TOGGLE_COMMENT => {
                let uri = Url::parse(required_str(&arguments, 0, "uri")?)
                    .map_err(|_| Error::invalid_params("Invalid 'uri' argument"))?;
                let start_line = required_usize(&arguments, 1, "startLine")?;
                let end_line = required_usize(&arguments, 2, "endLine")?;

                let Some(document) = self.document(&uri).await else {
                    return Ok(None);
                };
                let style = CommentStyle::from_setting(&self.config.read().await.comment_style);
                let edits = toggle_comment_edits(&document, start_line, end_line, &style);
                if edits.is_empty() {
                    return Ok(None);
                }
                let workspace_edit = replace_lines(&uri, &document, &edits);
                Ok(Some(
                    serde_json::to_value(workspace_edit).map_err(|_| Error::internal_error())?,
                ))
            }
            commands::COMMAND_INSERT_SEPARATOR => {
                let uri = Url::parse(required_str(&arguments, 0, "uri")?)
                    .map_err(|_| Error::invalid_params("Invalid 'uri' argument"))?;
                let start_line = required_usize(&arguments, 1, "startLine")?;
                let end_line = required_usize(&arguments, 2, "endLine")?;
                let has_selection = optional_bool(&arguments, 3);
                let unit = match optional_str(&arguments, 4, "=") {
                    "" => "=",
                    unit => unit,
                };

                if let Err(message) = validate_separator_unit(unit) {
                    self.client
                        .show_message(MessageType::WARNING, message.to_string())
                        .await;
                    return Ok(None);
                }
                let Some(document) = self.document(&uri).await else {
                    return Ok(None);
                };
                let total_length = self.config.read().await.separator_length;
                match plan_separator(
                    &document,
                    start_line,
                    end_line,
                    has_selection,
                    unit,
                    total_length,
                ) {
                    SeparatorAction::ReplaceLine { line, new_text } => {
                        let workspace_edit =
                            replace_lines(&uri, &document, &[LineEdit { line, new_text }]);
                        Ok(Some(
                            serde_json::to_value(workspace_edit)
                                .map_err(|_| Error::internal_error())?,
                        ))
                    }
                    SeparatorAction::InsertLine { line, text } => {
                        let workspace_edit = insert_line(&uri, &document, line, &text);
                        Ok(Some(
                            serde_json::to_value(workspace_edit)
                                .map_err(|_| Error::internal_error())?,
                        ))
                    }
                    SeparatorAction::AlreadyPresent => {
                        self.client
                            .show_message(
                                MessageType::INFO,
                                "Separator already present here.".to_string(),
                            )
                            .await;
                        Ok(None)
                    }
                    SeparatorAction::LineTooLong => {
                        self.client
                            .show_message(
                                MessageType::WARNING,
                                "Line would be too long. Increase separator length setting."
                                    .to_string(),
                            )
                            .await;
                        Ok(None)
                    }
                }
            }
            commands::COMMAND_INSERT_LINE_BREAK => {
                let uri = Url::parse(required_str(&arguments, 0, "uri")?)
                    .map_err(|_| Error::invalid_params("Invalid 'uri' argument"))?;
                let line = required_usize(&arguments, 1, "line")?;
                let character = required_usize(&arguments, 2, "character")?;

                let Some(document) = self.document(&uri).await else {
                    return Ok(None);
                };
                let Some(split) = split_with_continuation(&document, line, character) else {
                    return Ok(None);
                };
                let workspace_edit = replace_lines(
                    &uri,
                    &document,
                    &[LineEdit {
                        line: split.line,
                        new_text: split.new_text.clone(),
                    }],
                );
                Ok(Some(json!({
                    "edit": serde_json::to_value(workspace_edit)
                        .map_err(|_| Error::internal_error())?,
                    "cursor": {
                        "line": split.cursor_line,
                        "character": split.cursor_col,
                    },
                })))
            }
            _ => Err(Error::invalid_request()),
        }
    }
}
