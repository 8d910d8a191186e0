use crate::model::{LlmCall, ScanReport};
use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

pub fn print_markdown(report: &ScanReport) -> Result<()> {
    println!("{}", generate_markdown_string(report));
    Ok(())
}

pub fn generate_markdown_string(report: &ScanReport) -> String {
    let mut md = String::new();

    md.push_str("# LLM Call Report\n\n");
    let _ = writeln!(
        md,
        "**Scanned:** {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(md, "**Directory:** `{}`\n", report.directory);

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    let _ = writeln!(md, "| Total LLM Calls | {} |", report.summary.total_calls);
    let _ = writeln!(md, "| Files with Calls | {} |", report.summary.file_count);
    let _ = writeln!(
        md,
        "| Unique Providers | {} |",
        report.summary.unique_providers.len()
    );
    let _ = writeln!(
        md,
        "| Unique Models | {} |\n",
        report.summary.unique_models.len()
    );

    if !report.summary.unique_providers.is_empty() {
        md.push_str("## Providers Used\n\n");
        md.push_str("| Provider | Count |\n");
        md.push_str("|----------|-------|\n");
        for (provider, count) in counts_descending(&report.calls, |c| Some(c.provider.clone())) {
            let _ = writeln!(md, "| {} | {} |", provider, count);
        }
        md.push('\n');
    }

    if !report.summary.unique_models.is_empty() {
        md.push_str("## Models Used\n\n");
        md.push_str("| Model | Count |\n");
        md.push_str("|-------|-------|\n");
        for (model, count) in counts_descending(&report.calls, |c| c.model.clone()) {
            let _ = writeln!(md, "| {} | {} |", model, count);
        }
        md.push('\n');
    }

    md.push_str("## Detected Calls by File\n\n");
    let mut by_file: BTreeMap<&str, Vec<&LlmCall>> = BTreeMap::new();
    for call in &report.calls {
        by_file.entry(&call.file).or_default().push(call);
    }

    for (file, calls) in by_file {
        let _ = writeln!(md, "### `{}`\n", file);
        let plural = if calls.len() == 1 { "" } else { "s" };
        let _ = writeln!(md, "Found {} call{}:\n", calls.len(), plural);

        for (index, call) in calls.iter().enumerate() {
            let _ = writeln!(md, "#### {}. Line {}\n", index + 1, call.line);
            let _ = writeln!(md, "- **Provider:** {}", call.provider);
            if let Some(model) = &call.model {
                let _ = writeln!(md, "- **Model:** {}", model);
            }
            if let Some(endpoint) = &call.endpoint {
                let _ = writeln!(md, "- **Endpoint:** `{}`", endpoint);
            }
            let _ = writeln!(md, "- **Method:** {}", call.method);
            let _ = writeln!(md, "- **Confidence:** {}%\n", call.confidence);
            let _ = writeln!(md, "**Code:**\n```\n{}\n```\n", call.code_snippet);
        }
    }

    md
}

/// Per-value occurrence counts, most frequent first. Ties break by name so
/// the output is stable run-to-run.
fn counts_descending(
    calls: &[LlmCall],
    key: impl Fn(&LlmCall) -> Option<String>,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for call in calls {
        if let Some(k) = key(call) {
            *counts.entry(k).or_default() += 1;
        }
    }

    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries
}
