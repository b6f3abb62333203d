use crate::scan::Finding;

/// Compose the human-readable report document
pub fn render(findings: &[Finding]) -> String {
    let mut out = format!(
        "Found {} potentially unreferenced symbols:\n\n",
        findings.len()
    );

    if findings.is_empty() {
        out.push_str("No unreferenced symbols found. Great job!");
        return out;
    }

    for finding in findings {
        out.push_str(&format!("- {}: {}\n", finding.kind, finding.name));
        out.push_str(&format!(
            "  File: {} (Line {})\n\n",
            finding.file.display(),
            finding.line
        ));
    }
    out
}
