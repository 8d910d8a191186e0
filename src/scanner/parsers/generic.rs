//! Fallback line-oriented parser for any other source file.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzer::calculate_confidence;
use crate::model::{CallMethod, LlmCall};
use crate::scanner::code_snippet;
use crate::scanner::patterns::{
    best_match, extract_model, match_patterns, mentions_provider_url, MatchKind, LLM_PROVIDERS,
};

/// Default acceptance threshold. Higher than the language-aware parsers
/// because no structural signal is available here.
const GENERIC_THRESHOLD: u8 = 60;

static QUOTED_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("invalid literal pattern"));

static URL_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s'"]+"#).expect("invalid url pattern"));

/// Line-oriented parser with a configurable acceptance threshold.
///
/// Used directly for unrecognized languages (threshold 60) and as the
/// structural parser's fallback (threshold 70, since no reliable import
/// context exists there).
pub struct GenericParser {
    threshold: u8,
}

impl GenericParser {
    pub fn new() -> Self {
        Self {
            threshold: GENERIC_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Default for GenericParser {
    fn default() -> Self {
        Self::new()
    }
}

impl super::SourceParser for GenericParser {
    fn name(&self) -> &'static str {
        "Generic"
    }

    fn parse(&self, content: &str, file: &str) -> Vec<LlmCall> {
        let lines: Vec<&str> = content.split('\n').collect();

        // Heuristic import collection across languages: first quoted literal
        // on any line that looks like an import/require/use/include.
        let mut imports: HashSet<String> = HashSet::new();
        for line in &lines {
            let trimmed = line.trim();
            if trimmed.contains("import ")
                || trimmed.contains("require(")
                || trimmed.contains("use ")
                || trimmed.contains("include ")
            {
                if let Some(caps) = QUOTED_LITERAL.captures(trimmed) {
                    imports.insert(caps[1].to_string());
                }
            }
        }

        let mut calls = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let matches = match_patterns(line);
            if !matches.is_empty() {
                let snippet = code_snippet(content, idx);
                let confidence = calculate_confidence(&matches, &imports, &snippet);

                if confidence >= self.threshold {
                    // best_match is Some, matches is non-empty here
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
                        method: if best.kind == MatchKind::Endpoint {
                            CallMethod::Http
                        } else {
                            CallMethod::Sdk
                        },
                    });
                }
            }

            // Bare URL literals pointing at a catalog domain are reported
            // independently; a line can contribute both detections.
            for url in URL_LITERAL.find_iter(line) {
                let url = url.as_str();
                for provider in LLM_PROVIDERS {
                    if mentions_provider_url(provider, url) {
                        let snippet = code_snippet(content, idx);
                        calls.push(LlmCall {
                            file: file.to_string(),
                            line: idx + 1,
                            column: None,
                            provider: provider.name.to_string(),
                            model: extract_model(&snippet),
                            endpoint: Some(url.to_string()),
                            confidence: 75,
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
