//! Scan orchestration.
//!
//! Enumerates candidate files, dispatches each to the parser matching its
//! extension, and processes files in bounded concurrent batches. Per-file
//! failures (unreadable, binary, oversized) are swallowed: the file simply
//! contributes no detections. After collection, detections in the uncertain
//! confidence band can be escalated to a [`Verifier`]; the final list is
//! deduplicated, sorted by (file, line), and wrapped into a [`ScanReport`].
//!
//! # Example
//!
//! ```no_run
//! use llmscan::scanner::{run_scan, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ScanOptions::new("/path/to/project");
//!     let report = run_scan(&options, None).await?;
//!     println!("Found {} calls", report.summary.total_calls);
//!     Ok(())
//! }
//! ```

pub mod parsers;
pub mod patterns;
pub mod walker;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use futures::future::join_all;
use tracing::debug;

use crate::analyzer::{
    batch_verify, needs_verification, VerificationRequest, VerificationResult, Verifier,
};
use crate::model::{LlmCall, ScanReport};
use parsers::parser_for_extension;

/// Files above this size are skipped without being read.
const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Context lines kept on each side of a matched line.
const SNIPPET_CONTEXT_LINES: usize = 3;

/// Default number of concurrently scanned files.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Path fragments that mark a file as sensitive, checked before every read
/// in addition to the walker's exclusions.
const SENSITIVE_MARKERS: &[&str] = &[".key", ".pem", ".cert", "secrets", "credentials"];

/// Options for one scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Root directory to scan.
    pub directory: PathBuf,
    /// Upper bound on concurrently processed files.
    pub max_workers: usize,
}

impl ScanOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }
}

/// Raw result of the per-file scanning stage.
pub struct ScanOutcome {
    pub calls: Vec<LlmCall>,
    pub files_scanned: usize,
}

/// Returns the text window around `line_idx` (0-based): the line itself plus
/// [`SNIPPET_CONTEXT_LINES`] on each side, clipped to file bounds.
pub fn code_snippet(content: &str, line_idx: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = line_idx.saturating_sub(SNIPPET_CONTEXT_LINES);
    let end = (line_idx + SNIPPET_CONTEXT_LINES + 1).min(lines.len());
    lines[start.min(end)..end].join("\n")
}

/// Defense-in-depth check applied to every path before its content is read,
/// independent of the walker's filtering.
pub fn is_sensitive_path(path: &Path) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");

    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if name.starts_with(".env") {
            return true;
        }
    }

    if SENSITIVE_MARKERS.iter().any(|m| normalized.contains(m)) {
        return true;
    }

    walker::EXCLUDED_DIRS
        .iter()
        .any(|dir| normalized.contains(&format!("/{}/", dir)))
}

/// Scans every candidate file under `options.directory` in bounded batches.
///
/// Individual file failures are logged and swallowed; this function only
/// fails if the batching machinery itself does, which it does not.
pub async fn scan_directory(options: &ScanOptions) -> Result<ScanOutcome> {
    let files = walker::collect_files(&options.directory);
    debug!(count = files.len(), "enumerated candidate files");

    let mut calls = Vec::new();
    let mut files_scanned = 0usize;

    for batch in files.chunks(options.max_workers.max(1)) {
        let results = join_all(
            batch
                .iter()
                .map(|path| scan_file(path, &options.directory)),
        )
        .await;

        for file_calls in results {
            if let Some(file_calls) = file_calls {
                files_scanned += 1;
                calls.extend(file_calls);
            }
        }
    }

    Ok(ScanOutcome {
        calls,
        files_scanned,
    })
}

/// Scans one file. Returns `None` when the file was skipped (sensitive,
/// oversized, unreadable, or binary); skipped files do not count as scanned.
async fn scan_file(path: &Path, root: &Path) -> Option<Vec<LlmCall>> {
    if is_sensitive_path(path) {
        debug!(path = %path.display(), "skipping sensitive path");
        return None;
    }

    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };
    if metadata.len() > MAX_FILE_SIZE {
        debug!(path = %path.display(), size = metadata.len(), "skipping oversized file");
        return None;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };
    let content = match String::from_utf8(bytes) {
        Ok(c) => c,
        Err(_) => {
            debug!(path = %path.display(), "skipping binary file");
            return None;
        }
    };

    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let parser = parser_for_extension(extension);
    Some(parser.parse(&content, &relative))
}

/// Applies verification results to the call list.
///
/// Only calls in the uncertain band are touched. A negative result deletes
/// the call; a positive one raises its confidence to the maximum of the two
/// values and backfills provider/model when the verifier supplied them.
pub fn apply_verification(
    calls: Vec<LlmCall>,
    results: &HashMap<(String, usize), VerificationResult>,
) -> Vec<LlmCall> {
    calls
        .into_iter()
        .filter_map(|mut call| {
            if !needs_verification(call.confidence) {
                return Some(call);
            }
            let Some(verdict) = results.get(&(call.file.clone(), call.line)) else {
                return Some(call);
            };

            if !verdict.is_llm_call {
                return None;
            }

            call.confidence = call.confidence.max(verdict.confidence);
            if let Some(provider) = &verdict.provider {
                call.provider = provider.clone();
            }
            if call.model.is_none() {
                call.model = verdict.model.clone();
            }
            Some(call)
        })
        .collect()
}

/// Collapses near-duplicate detections.
///
/// Two detections with the same (file, line, provider, method) are one
/// finding reported twice, typically by the pattern path and the URL path.
/// The higher confidence wins; on ties the one carrying an endpoint does.
pub fn dedup_calls(calls: Vec<LlmCall>) -> Vec<LlmCall> {
    let mut kept: Vec<LlmCall> = Vec::with_capacity(calls.len());
    let mut index: HashMap<(String, usize, String, &'static str), usize> = HashMap::new();

    for call in calls {
        let key = (
            call.file.clone(),
            call.line,
            call.provider.clone(),
            call.method.as_str(),
        );
        match index.get(&key) {
            None => {
                index.insert(key, kept.len());
                kept.push(call);
            }
            Some(&i) => {
                let existing = &kept[i];
                let better = call.confidence > existing.confidence
                    || (call.confidence == existing.confidence
                        && existing.endpoint.is_none()
                        && call.endpoint.is_some());
                if better {
                    kept[i] = call;
                }
            }
        }
    }

    kept
}

/// Sorts detections by file path, then line, ascending.
pub fn sort_calls(calls: &mut [LlmCall]) {
    calls.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
}

/// Runs a complete scan: enumerate, parse, verify (when a verifier is
/// given), dedup, sort, and wrap into a [`ScanReport`].
///
/// # Errors
///
/// Fails only on configuration errors: a missing or non-directory target.
/// Every per-file and per-verification failure is recovered locally.
pub async fn run_scan(
    options: &ScanOptions,
    verifier: Option<&dyn Verifier>,
) -> Result<ScanReport> {
    if !options.directory.exists() {
        bail!("Directory not found: {}", options.directory.display());
    }
    if !options.directory.is_dir() {
        bail!("Not a directory: {}", options.directory.display());
    }

    let outcome = scan_directory(options).await?;
    let mut calls = outcome.calls;

    if let Some(verifier) = verifier {
        let mut seen: HashSet<(String, usize)> = HashSet::new();
        let requests: Vec<VerificationRequest> = calls
            .iter()
            .filter(|c| needs_verification(c.confidence))
            .filter(|c| seen.insert((c.file.clone(), c.line)))
            .map(VerificationRequest::for_call)
            .collect();

        if !requests.is_empty() {
            debug!(count = requests.len(), "verifying uncertain detections");
            let results = batch_verify(verifier, &requests).await;
            calls = apply_verification(calls, &results);
        }
    }

    let mut calls = dedup_calls(calls);
    sort_calls(&mut calls);

    Ok(ScanReport::new(
        options.directory.display().to_string(),
        calls,
        outcome.files_scanned,
    ))
}
