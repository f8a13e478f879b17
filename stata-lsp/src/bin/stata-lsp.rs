use serde_json::{json, Value};
use stata_analysis::document::DoDocument;
use stata_analysis::outline::{document_outline, OutlineKind, OutlineNode};
use stata_lsp::StataLanguageServer;
use std::env;
use std::fs;
use std::process::ExitCode;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // If called with "outline" subcommand, handle it and exit
    if args.len() >= 2 && args[1] == "outline" {
        return handle_outline(&args[2..]);
    }

    // Default: run as LSP server
    let stdin = stdin();
    let stdout = stdout();
    let (service, socket) = LspService::new(StataLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
    ExitCode::SUCCESS
}

fn handle_outline(args: &[String]) -> ExitCode {
    let mut input_path: Option<&str> = None;
    let mut show_numbering = true;

    for arg in args {
        if arg == "--no-numbering" {
            show_numbering = false;
        } else if !arg.starts_with('-') && input_path.is_none() {
            input_path = Some(arg);
        }
    }

    let Some(input) = input_path else {
        eprintln!("Error: No input file specified");
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(input) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("Error reading {input}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let document = DoDocument::new(&source);
    let outline = document_outline(&document, show_numbering);
    let forest = Value::Array(outline.iter().map(node_to_json).collect());

    match serde_json::to_string_pretty(&forest) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Error rendering outline: {error}");
            ExitCode::FAILURE
        }
    }
}

fn node_to_json(node: &OutlineNode) -> Value {
    json!({
        "title": node.display_title,
        "kind": match node.kind {
            OutlineKind::Heading => "heading",
            OutlineKind::Program => "program",
        },
        "startLine": node.span.start,
        "endLine": node.span.end,
        "children": node.children.iter().map(node_to_json).collect::<Vec<_>>(),
    })
}
