use crate::scan::ScanOutcome;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    total_findings: usize,
    cancelled: bool,
    files: JsonFileSummary,
    findings: Vec<JsonFinding<'a>>,
}

#[derive(Serialize)]
struct JsonFileSummary {
    total: usize,
    scanned: usize,
    skipped: usize,
    failed: usize,
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    name: &'a str,
    kind: &'a str,
    file: String,
    line: u32,
}

/// Machine-readable report document
pub fn render(outcome: &ScanOutcome) -> Result<String> {
    let report = JsonReport {
        version: "1.0",
        total_findings: outcome.findings.len(),
        cancelled: outcome.cancelled,
        files: JsonFileSummary {
            total: outcome.files_total,
            scanned: outcome.files_scanned,
            skipped: outcome.files_skipped,
            failed: outcome.files_failed,
        },
        findings: outcome
            .findings
            .iter()
            .map(|f| JsonFinding {
                name: &f.name,
                kind: &f.kind,
                file: f.file.to_string_lossy().to_string(),
                line: f.line,
            })
            .collect(),
    };

    serde_json::to_string_pretty(&report).into_diagnostic()
}
