use proptest::prelude::*;
use stata_lsp::server::{DefaultFeatureProvider, LspClient};
use stata_lsp::StataLanguageServer;
use std::sync::Arc;
use tower_lsp::lsp_types::{
    ApplyWorkspaceEditResponse, DidOpenTextDocumentParams, ExecuteCommandParams, MessageType,
    TextDocumentItem, Url, WorkspaceEdit,
};
use tower_lsp::LanguageServer;

// Mock client for testing
#[derive(Clone)]
struct MockClient;

use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;

#[async_trait]
impl LspClient for MockClient {
    async fn apply_edit(&self, _: WorkspaceEdit) -> Result<ApplyWorkspaceEditResponse> {
        Ok(ApplyWorkspaceEditResponse {
            applied: true,
            failure_reason: None,
            failed_change: None,
        })
    }

    async fn show_message(&self, _: MessageType, _: String) {}

    async fn log_message(&self, _: MessageType, _: String) {}
}

proptest! {
    // Fuzz the execute_command handler with random commands and arguments
    #[test]
    fn test_execute_command_robustness(
        command in "\\PC*",
        args_json in "\\PC*",
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let features = Arc::new(DefaultFeatureProvider::new());
            let server = StataLanguageServer::with_features(MockClient, features);

            // Try to parse args as JSON, if valid, use them, otherwise use empty array
            let arguments = serde_json::from_str(&args_json).unwrap_or_else(|_| vec![]);

            let params = ExecuteCommandParams {
                command,
                arguments,
                work_done_progress_params: Default::default(),
            };

            // Should not panic
            let _ = server.execute_command(params).await;
        });
    }

    // Fuzz the line scanner and numbering synchronizer via did_open
    #[test]
    fn test_document_scanning_robustness(
        text in "\\PC*",
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let features = Arc::new(DefaultFeatureProvider::new());
            let server = StataLanguageServer::with_features(MockClient, features);
            let uri = Url::parse("file:///test.do").unwrap();

            let params = DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri.clone(),
                    language_id: "stata".to_string(),
                    version: 1,
                    text: text.clone(),
                },
            };

            // Should not panic
            server.did_open(params).await;

            // Outline + numbering sync on the potentially malformed document
            let _ = server.document_symbol(tower_lsp::lsp_types::DocumentSymbolParams {
                text_document: tower_lsp::lsp_types::TextDocumentIdentifier { uri: uri.clone() },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            }).await;
        });
    }
}
