//! Log channel: one grep-friendly line per finding

use crate::scan::Finding;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Plain-text lines written to the log channel, summary last
pub fn log_lines(findings: &[Finding]) -> Vec<String> {
    let mut lines: Vec<String> = findings.iter().map(|f| f.to_string()).collect();
    lines.push(String::new());
    lines.push(format!("→ Found {} unreferenced symbols.", findings.len()));
    lines
}

/// Destination for the per-finding log lines
pub struct LogChannel {
    sink: Box<dyn Write>,
    /// Only the terminal gets colors
    colored: bool,
}

impl LogChannel {
    pub fn stderr() -> Self {
        Self {
            sink: Box::new(std::io::stderr()),
            colored: console::Term::stderr().features().colors_supported(),
        }
    }

    /// Open a log file, discarding anything a previous run wrote there
    pub fn file(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to open log file: {}", path.display()))?;
        Ok(Self::from_writer(Box::new(BufWriter::new(file))))
    }

    pub fn from_writer(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            colored: false,
        }
    }

    pub fn write_findings(&mut self, findings: &[Finding]) -> Result<()> {
        let lines = log_lines(findings);
        let last = lines.len() - 1;

        for (i, line) in lines.iter().enumerate() {
            if i == last && self.colored {
                writeln!(self.sink, "{}", line.yellow().bold()).into_diagnostic()?;
            } else {
                writeln!(self.sink, "{}", line).into_diagnostic()?;
            }
        }
        self.sink.flush().into_diagnostic()
    }
}
