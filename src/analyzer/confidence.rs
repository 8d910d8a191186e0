//! Confidence scoring for raw pattern matches.
//!
//! Turns the low-precision hits from the pattern matcher into a single
//! 0-100 confidence value using additive heuristics, and decides which
//! detections fall into the uncertain band worth escalating to an LLM.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scanner::patterns::{best_match, MatchKind, PatternMatch};

/// Import substrings that strengthen a detection when present anywhere in
/// the file's collected imports.
const RELEVANT_IMPORTS: &[&str] = &["openai", "anthropic", "google", "cohere", "langchain"];

static MODEL_NAME_HINTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["(?i)gpt-4", r"(?i)gpt-3\.5", "(?i)claude", "(?i)gemini", "(?i)command"]
        .iter()
        .map(|p| Regex::new(p).expect("invalid model hint pattern"))
        .collect()
});

/// Combines pattern matches, the file's imports, and the surrounding snippet
/// into a confidence value in [0, 100].
///
/// Fails closed: an empty match list scores exactly 0. Each boost is
/// independently additive; the result is clamped to 100.
pub fn calculate_confidence(
    matches: &[PatternMatch],
    imports: &HashSet<String>,
    code_snippet: &str,
) -> u8 {
    let base = match best_match(matches) {
        Some(m) => m.weight as u32,
        None => return 0,
    };
    let mut confidence = base;

    // Multiple kinds of evidence reinforce each other.
    let kinds: HashSet<MatchKind> = matches.iter().map(|m| m.kind).collect();
    if kinds.len() > 1 {
        confidence += 10;
    }

    let has_relevant_import = imports.iter().any(|imp| {
        let lower = imp.to_lowercase();
        RELEVANT_IMPORTS.iter().any(|rel| lower.contains(rel))
    });
    if has_relevant_import {
        confidence += 15;
    }

    if MODEL_NAME_HINTS.iter().any(|p| p.is_match(code_snippet)) {
        confidence += 10;
    }

    // Credential usage nearby raises confidence. Only the marker substrings
    // are inspected; actual key values are never read or logged.
    if code_snippet.contains("API_KEY")
        || code_snippet.contains("api_key")
        || code_snippet.contains("apiKey")
    {
        confidence += 5;
    }

    confidence.min(100) as u8
}

/// True exactly for the uncertain band [40, 80) where pattern matching alone
/// is neither clearly right nor clearly wrong.
pub fn needs_verification(confidence: u8) -> bool {
    (40..80).contains(&confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::patterns::{match_patterns, weights};

    fn no_imports() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_empty_matches_score_zero() {
        assert_eq!(calculate_confidence(&[], &no_imports(), "anything"), 0);
    }

    #[test]
    fn test_base_is_highest_weighted_match() {
        // Import (70) and api_call (90) both hit; base must be 90, plus the
        // multi-kind boost.
        let matches = match_patterns("import openai\nopenai.completions.create()");
        let score = calculate_confidence(&matches, &no_imports(), "x = 1");
        assert_eq!(score, weights::API_CALL + 10);
    }

    #[test]
    fn test_relevant_import_boost() {
        // Wrapper import base (75) leaves headroom below the 100 clamp.
        let matches = match_patterns("from haystack import Pipeline");
        assert!(!matches.is_empty());
        let without = calculate_confidence(&matches, &no_imports(), "x");

        let mut imports = HashSet::new();
        imports.insert("@anthropic-ai/sdk".to_string());
        let with = calculate_confidence(&matches, &imports, "x");

        assert_eq!(with, without + 15);
    }

    #[test]
    fn test_model_name_boost_is_case_insensitive() {
        let matches = match_patterns("client.messages.create(...)");
        let without = calculate_confidence(&matches, &no_imports(), "plain");
        let with = calculate_confidence(&matches, &no_imports(), "model: 'CLAUDE-3-opus'");
        assert_eq!(with, without + 10);
    }

    #[test]
    fn test_api_key_proximity_boost() {
        let matches = match_patterns("client.messages.create(...)");
        let without = calculate_confidence(&matches, &no_imports(), "plain");
        let with = calculate_confidence(&matches, &no_imports(), "apiKey: secret");
        assert_eq!(with, without + 5);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let mut imports = HashSet::new();
        imports.insert("openai".to_string());
        let matches =
            match_patterns("import openai\nopenai.chat.completions.create(model='gpt-4')");
        let score = calculate_confidence(
            &matches,
            &imports,
            "api_key=os.environ\nmodel='gpt-4'",
        );
        assert_eq!(score, 100);
    }

    #[test]
    fn test_needs_verification_band_boundaries() {
        assert!(!needs_verification(39));
        assert!(needs_verification(40));
        assert!(needs_verification(79));
        assert!(!needs_verification(80));
        assert!(!needs_verification(0));
        assert!(!needs_verification(100));
    }
}
