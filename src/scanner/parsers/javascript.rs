//! Structural parser for the JS/TS family, built on tree-sitter.
//!
//! Uses the TSX grammar so one parser covers plain JavaScript, JSX, and
//! typed variants. Two independent things happen during the walk: static
//! import specifiers feed the confidence scorer, and every call expression
//! is pattern-matched against the catalog. Calls through `fetch` or a known
//! HTTP-client object with a literal provider URL bypass the scorer
//! entirely; a literal LLM-domain URL in an HTTP call is unambiguous.

use std::collections::HashSet;

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::analyzer::calculate_confidence;
use crate::model::{CallMethod, LlmCall};
use crate::scanner::code_snippet;
use crate::scanner::patterns::{
    best_match, extract_model, match_patterns, mentions_provider_url, MatchKind, LLM_PROVIDERS,
};

const ACCEPT_THRESHOLD: u8 = 40;

/// Confidence when the structural-parse fallback runs; stricter because no
/// import context is available there.
const FALLBACK_THRESHOLD: u8 = 70;

/// Identifiers treated as HTTP-client objects in `object.method(url)` calls.
const HTTP_CLIENT_OBJECTS: &[&str] = &["axios", "http", "https"];

pub struct JavaScriptParser;

impl super::SourceParser for JavaScriptParser {
    fn name(&self) -> &'static str {
        "JavaScript/TypeScript"
    }

    fn parse(&self, content: &str, file: &str) -> Vec<LlmCall> {
        let mut parser = Parser::new();
        let language = tree_sitter_typescript::LANGUAGE_TSX;
        if parser.set_language(&language.into()).is_err() {
            return fallback(content, file);
        }

        let tree = match parser.parse(content, None) {
            Some(tree) => tree,
            None => {
                debug!(file, "structural parse failed, falling back to line matching");
                return fallback(content, file);
            }
        };

        let root = tree.root_node();
        let source = content.as_bytes();

        let mut imports: HashSet<String> = HashSet::new();
        for_each_node(root, |node| {
            if node.kind() == "import_statement" {
                if let Some(specifier) = node.child_by_field_name("source") {
                    let text = specifier.utf8_text(source).unwrap_or("");
                    imports.insert(text.trim_matches(|c| c == '"' || c == '\'').to_string());
                }
            }
        });

        let mut calls = Vec::new();
        for_each_node(root, |node| {
            if node.kind() != "call_expression" {
                return;
            }

            let row = node.start_position().row;
            let column = node.start_position().column;
            let snippet = code_snippet(content, row);

            let matches = match_patterns(&snippet);
            if !matches.is_empty() {
                let confidence = calculate_confidence(&matches, &imports, &snippet);
                if confidence >= ACCEPT_THRESHOLD {
                    let best = best_match(&matches).unwrap();
                    calls.push(LlmCall {
                        file: file.to_string(),
                        line: row + 1,
                        column: Some(column),
                        provider: best.provider.to_string(),
                        model: extract_model(&snippet),
                        endpoint: None,
                        confidence,
                        code_snippet: snippet.clone(),
                        method: match best.kind {
                            MatchKind::Import => CallMethod::Wrapper,
                            MatchKind::Endpoint => CallMethod::Http,
                            _ => CallMethod::Sdk,
                        },
                    });
                }
            }

            if let Some(url) = literal_http_url(node, source) {
                for provider in LLM_PROVIDERS {
                    if mentions_provider_url(provider, &url) {
                        calls.push(LlmCall {
                            file: file.to_string(),
                            line: row + 1,
                            column: Some(column),
                            provider: provider.name.to_string(),
                            model: extract_model(&snippet),
                            endpoint: Some(url.clone()),
                            confidence: 85,
                            code_snippet: snippet.clone(),
                            method: CallMethod::Http,
                        });
                        break;
                    }
                }
            }
        });

        calls
    }
}

fn fallback(content: &str, file: &str) -> Vec<LlmCall> {
    use super::SourceParser;
    super::GenericParser::with_threshold(FALLBACK_THRESHOLD).parse(content, file)
}

/// Depth-first pre-order walk over every node in the tree.
fn for_each_node<'a, F: FnMut(Node<'a>)>(root: Node<'a>, mut f: F) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        f(node);
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
}

/// For a call like `fetch("...")` or `axios.post("...")`, returns the
/// literal URL of the first argument, if there is one.
fn literal_http_url(call: Node, source: &[u8]) -> Option<String> {
    let callee = call.child_by_field_name("function")?;

    let is_http_call = match callee.kind() {
        "identifier" => callee.utf8_text(source).unwrap_or("") == "fetch",
        "member_expression" => {
            let object = callee.child_by_field_name("object")?;
            object.kind() == "identifier"
                && HTTP_CLIENT_OBJECTS.contains(&object.utf8_text(source).unwrap_or(""))
        }
        _ => false,
    };
    if !is_http_call {
        return None;
    }

    let args = call.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }

    let text = first.utf8_text(source).unwrap_or("");
    Some(text.trim_matches(|c| c == '"' || c == '\'').to_string())
}
