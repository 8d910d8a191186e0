use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::LlmCall;

/// Aggregate counts over a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_calls: usize,
    pub unique_models: Vec<String>,
    pub unique_providers: Vec<String>,
    /// Distinct files that produced at least one call.
    pub file_count: usize,
    /// Files actually dispatched to a parser.
    pub files_scanned: usize,
}

/// The final artifact of a scan, handed to the output renderers.
///
/// Invariants: `summary.total_calls == calls.len()`, and the unique lists
/// are the sorted distinct non-empty values present in `calls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub directory: String,
    pub summary: ScanSummary,
    pub calls: Vec<LlmCall>,
}

impl ScanReport {
    /// Builds a report from the final call list. `calls` is expected to be
    /// already deduplicated and sorted by (file, line).
    pub fn new(directory: impl Into<String>, calls: Vec<LlmCall>, files_scanned: usize) -> Self {
        let unique_models: BTreeSet<String> =
            calls.iter().filter_map(|c| c.model.clone()).collect();
        let unique_providers: BTreeSet<String> =
            calls.iter().map(|c| c.provider.clone()).collect();
        let unique_files: BTreeSet<&str> = calls.iter().map(|c| c.file.as_str()).collect();

        Self {
            scanned_at: Utc::now(),
            directory: directory.into(),
            summary: ScanSummary {
                total_calls: calls.len(),
                unique_models: unique_models.into_iter().collect(),
                unique_providers: unique_providers.into_iter().collect(),
                file_count: unique_files.len(),
                files_scanned,
            },
            calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallMethod;

    fn call(file: &str, line: usize, provider: &str, model: Option<&str>) -> LlmCall {
        LlmCall {
            file: file.to_string(),
            line,
            column: None,
            provider: provider.to_string(),
            model: model.map(String::from),
            endpoint: None,
            confidence: 90,
            code_snippet: String::new(),
            method: CallMethod::Sdk,
        }
    }

    #[test]
    fn test_summary_counts_match_calls() {
        let calls = vec![
            call("a.py", 1, "OpenAI", Some("gpt-4")),
            call("a.py", 8, "Anthropic", None),
            call("b.ts", 3, "OpenAI", Some("gpt-4")),
        ];
        let report = ScanReport::new("/tmp/project", calls, 12);

        assert_eq!(report.summary.total_calls, report.calls.len());
        assert_eq!(report.summary.file_count, 2);
        assert_eq!(report.summary.files_scanned, 12);
    }

    #[test]
    fn test_unique_lists_are_sorted_distinct() {
        let calls = vec![
            call("z.py", 1, "OpenAI", Some("gpt-4")),
            call("a.py", 2, "Anthropic", Some("claude-3-opus")),
            call("m.py", 3, "OpenAI", Some("gpt-4")),
        ];
        let report = ScanReport::new("/tmp/project", calls, 3);

        assert_eq!(report.summary.unique_providers, vec!["Anthropic", "OpenAI"]);
        assert_eq!(
            report.summary.unique_models,
            vec!["claude-3-opus", "gpt-4"]
        );
    }

    #[test]
    fn test_empty_scan_produces_empty_summary() {
        let report = ScanReport::new("/tmp/project", Vec::new(), 0);

        assert_eq!(report.summary.total_calls, 0);
        assert!(report.summary.unique_models.is_empty());
        assert!(report.summary.unique_providers.is_empty());
        assert_eq!(report.summary.file_count, 0);
    }
}
