//! Reporting layer: merges external probe results into the per-document
//! diagnostics, renders text or JSON output, and computes the exit code.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::external::{ExternalResult, Outcome};
use crate::types::{Diagnostic, PendingCheck};

/// Validation output for one document, ready for rendering. Workers (or a
/// sequential scan) each own one of these; merging is append-only.
#[derive(Debug, serde::Serialize)]
pub struct DocumentReport {
    /// Findings for this document, internal and external.
    pub diagnostics: Vec<Diagnostic>,
    /// Document path relative to the scan root.
    pub path: PathBuf,
    /// External references queued for the remote resolver.
    pub pending: Vec<PendingCheck>,
}

/// Unique pending URLs across all documents, in first-seen order. Probing
/// each URL once is enough; failures are attributed back to every line that
/// referenced it.
pub fn dedup_pending_urls(reports: &[DocumentReport]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut urls = Vec::new();
    for report in reports {
        for pending in &report.pending {
            if seen.insert(pending.url.as_str()) {
                urls.push(pending.url.clone());
            }
        }
    }
    urls
}

/// Convert unreachable/error probe outcomes into diagnostics on every
/// document line that referenced the failing URL.
pub fn attach_external_failures(reports: &mut [DocumentReport], results: &[ExternalResult]) {
    let failures: HashMap<&str, String> = results
        .iter()
        .filter_map(|r| match &r.outcome {
            Outcome::Reachable => None,
            Outcome::Unreachable(code) => Some((
                r.url.as_str(),
                format!("external link {} failed with status {code}", r.url),
            )),
            Outcome::Error(reason) => Some((
                r.url.as_str(),
                format!("external link {} failed: {reason}", r.url),
            )),
        })
        .collect();

    for report in reports.iter_mut() {
        for pending in &report.pending {
            if let Some(message) = failures.get(pending.url.as_str()) {
                report.diagnostics.push(Diagnostic {
                    content: pending.url.clone(),
                    line: pending.line,
                    message: message.clone(),
                });
            }
        }
    }
}

/// Total number of diagnostics across all documents.
pub fn issue_count(reports: &[DocumentReport]) -> usize {
    reports.iter().map(|r| r.diagnostics.len()).sum()
}

/// Render the human-readable report: `path:line  message` per finding,
/// grouped by document, followed by a summary line.
pub fn render_text(reports: &[DocumentReport]) -> String {
    let mut out = String::new();

    for report in reports {
        if report.diagnostics.is_empty() {
            continue;
        }

        let mut sorted: Vec<&Diagnostic> = report.diagnostics.iter().collect();
        sorted.sort_by_key(|d| d.line);

        for diagnostic in sorted {
            let _ = writeln!(
                out,
                "{}:{}  {}",
                report.path.display(),
                diagnostic.line,
                diagnostic.message
            );
        }
    }

    let issues = issue_count(reports);
    let documents = reports.len();
    let document_noun = if documents == 1 { "document" } else { "documents" };
    if issues == 0 {
        let _ = writeln!(out, "{documents} {document_noun} checked, no issues");
    } else {
        let issue_noun = if issues == 1 { "issue" } else { "issues" };
        let _ = writeln!(out, "{documents} {document_noun} checked, {issues} {issue_noun}");
    }

    return out;
}

/// Render the full report as pretty-printed JSON.
pub fn render_json(reports: &[DocumentReport]) -> String {
    #[derive(serde::Serialize)]
    struct JsonReport<'a> {
        /// Per-document findings and pending external checks.
        documents: &'a [DocumentReport],
        /// Total diagnostic count, mirrors the exit-code decision.
        issues: usize,
    }

    let wrapper = JsonReport {
        documents: reports,
        issues: issue_count(reports),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    return serde_json::to_string_pretty(&wrapper).unwrap_or_default();
}

/// Exit code priority: hard errors (2, handled in main) > issues (1) > clean (0).
pub fn exit_code(reports: &[DocumentReport]) -> ExitCode {
    if issue_count(reports) > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
