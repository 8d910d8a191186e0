//! Line-oriented parser for Python sources.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzer::calculate_confidence;
use crate::model::{CallMethod, LlmCall};
use crate::scanner::code_snippet;
use crate::scanner::patterns::{
    best_match, extract_model, match_patterns, mentions_provider_url, MatchKind, LLM_PROVIDERS,
};

const ACCEPT_THRESHOLD: u8 = 40;

/// HTTP-client call markers that trigger the URL window check.
const HTTP_MARKERS: &[&str] = &["requests.post", "requests.get", "httpx.post", "aiohttp"];

static IMPORT_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:import|from)\s+([a-zA-Z0-9_.]+)").expect("invalid import pattern"));

pub struct PythonParser;

impl super::SourceParser for PythonParser {
    fn name(&self) -> &'static str {
        "Python"
    }

    fn parse(&self, content: &str, file: &str) -> Vec<LlmCall> {
        let lines: Vec<&str> = content.split('\n').collect();

        // Pass 1: collect dotted import targets.
        let mut imports: HashSet<String> = HashSet::new();
        for line in &lines {
            let trimmed = line.trim();
            if trimmed.starts_with("import ") || trimmed.starts_with("from ") {
                if let Some(caps) = IMPORT_TARGET.captures(trimmed) {
                    imports.insert(caps[1].to_string());
                }
            }
        }

        // Pass 2: per-line pattern matching plus the HTTP-client window check.
        let mut calls = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            let matches = match_patterns(line);
            if !matches.is_empty() {
                let snippet = code_snippet(content, idx);
                let confidence = calculate_confidence(&matches, &imports, &snippet);

                if confidence >= ACCEPT_THRESHOLD {
                    let best = best_match(&matches).unwrap();
                    calls.push(LlmCall {
                        file: file.to_string(),
                        line: idx + 1,
                        column: None,
                        provider: best.provider.to_string(),
                        model: extract_model(&snippet),
                        endpoint: None,
                        confidence,
                        code_snippet: snippet,
                        method: match best.kind {
                            MatchKind::Import => CallMethod::Wrapper,
                            MatchKind::Endpoint => CallMethod::Http,
                            _ => CallMethod::Sdk,
                        },
                    });
                }
            }

            // requests/httpx/aiohttp call: look for a provider URL in the
            // surrounding window (2 lines before through 4 after).
            if HTTP_MARKERS.iter().any(|m| line.contains(m)) {
                let start = idx.saturating_sub(2);
                let end = (idx + 5).min(lines.len());
                let window = lines[start..end].join("\n");

                for provider in LLM_PROVIDERS {
                    if mentions_provider_url(provider, &window) {
                        let snippet = code_snippet(content, idx);
                        calls.push(LlmCall {
                            file: file.to_string(),
                            line: idx + 1,
                            column: None,
                            provider: provider.name.to_string(),
                            model: extract_model(&snippet),
                            endpoint: None,
                            confidence: 80,
                            code_snippet: snippet,
                            method: CallMethod::Http,
                        });
                        break;
                    }
                }
            }
        }

        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::parsers::SourceParser;

    #[test]
    fn test_sdk_call_with_import_context() {
        let content = "import openai\n\nresponse = openai.chat.completions.create(\n    model=\"gpt-4\",\n    messages=messages,\n)\n";
        let calls = PythonParser.parse(content, "bot.py");

        let sdk = calls
            .iter()
            .find(|c| c.method == CallMethod::Sdk)
            .expect("sdk detection");
        assert_eq!(sdk.provider, "OpenAI");
        assert_eq!(sdk.line, 3);
        assert_eq!(sdk.model.as_deref(), Some("gpt-4"));
        assert!(sdk.confidence >= 80);
    }

    #[test]
    fn test_bare_import_line_reports_wrapper_method() {
        let content = "import anthropic\n";
        let calls = PythonParser.parse(content, "bot.py");

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, CallMethod::Wrapper);
        assert_eq!(calls[0].provider, "Anthropic");
        assert_eq!(calls[0].line, 1);
    }

    #[test]
    fn test_http_marker_with_url_in_window() {
        let content = "\
import requests

url = \"https://api.anthropic.com/v1/messages\"
response = requests.post(
    url,
    headers=headers,
    json=payload,
)
";
        let calls = PythonParser.parse(content, "client.py");

        let http = calls
            .iter()
            .find(|c| c.method == CallMethod::Http && c.confidence == 80)
            .expect("window detection");
        assert_eq!(http.provider, "Anthropic");
        assert_eq!(http.line, 4);
        assert!(http.endpoint.is_none());
    }

    #[test]
    fn test_http_marker_without_provider_url_is_ignored() {
        let content = "import requests\nresponse = requests.get(\"https://example.com/data\")\n";
        let calls = PythonParser.parse(content, "client.py");
        assert!(calls.iter().all(|c| c.confidence != 80));
    }

    #[test]
    fn test_comment_mention_yields_nothing() {
        let calls = PythonParser.parse("# openai is a great company\n", "notes.py");
        assert!(calls.is_empty());
    }
}
