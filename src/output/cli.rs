use crate::model::ScanReport;
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CallRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Method")]
    method: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Directory: {}", report.directory);
    println!();

    if report.calls.is_empty() {
        println!("No LLM API calls found.");
    } else {
        println!("Found {} LLM API calls:", report.calls.len());
        println!();

        let rows: Vec<CallRow> = report
            .calls
            .iter()
            .enumerate()
            .map(|(i, c)| CallRow {
                index: i + 1,
                file: truncate(&c.file, 50),
                line: c.line,
                provider: c.provider.clone(),
                model: c.model.clone().unwrap_or_else(|| "-".to_string()),
                confidence: format!("{}%", c.confidence),
                method: c.method.to_string(),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!();
    print_summary(report);

    Ok(())
}

/// Keeps the tail of the path, counting chars so multi-byte file names
/// never split mid-character.
fn truncate(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        return s.to_string();
    }
    let tail: String = s.chars().skip(count - (max_len - 3)).collect();
    format!("...{}", tail)
}

fn print_summary(report: &ScanReport) {
    let summary = &report.summary;

    println!("Summary:");
    println!("  Files scanned: {}", summary.files_scanned);
    println!("  Total calls: {}", summary.total_calls);

    if !summary.unique_providers.is_empty() {
        println!("  Providers: {}", summary.unique_providers.join(", "));
    }
    if !summary.unique_models.is_empty() {
        println!("  Models: {}", summary.unique_models.join(", "));
    }
}
