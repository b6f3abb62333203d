mod json;
mod log;
mod markdown;

pub use log::{log_lines, LogChannel};

use crate::scan::ScanOutcome;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Format of the report document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Readable bullet list (default)
    #[default]
    Markdown,
    /// JSON machine-readable format
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}

/// Options for report generation
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Write the document here instead of stdout
    pub output_path: Option<PathBuf>,
    /// Write the log channel here instead of stderr
    pub log_path: Option<PathBuf>,
    /// Skip the log channel unless it goes to a file
    pub quiet: bool,
}

/// Writes the log channel and the report document for a finished scan
pub struct Reporter {
    format: ReportFormat,
    options: ReportOptions,
}

impl Reporter {
    pub fn new(format: ReportFormat, options: ReportOptions) -> Self {
        Self { format, options }
    }

    /// Report the findings; runs for cancelled and empty scans too
    pub fn report(&self, outcome: &ScanOutcome) -> Result<()> {
        if outcome.cancelled {
            warn!(
                "Scan was cancelled; reporting {} findings from the files processed so far",
                outcome.findings.len()
            );
        }

        match &self.options.log_path {
            Some(path) => LogChannel::file(path)?.write_findings(&outcome.findings)?,
            None if !self.options.quiet => LogChannel::stderr().write_findings(&outcome.findings)?,
            None => {}
        }

        let document = self.render(outcome)?;

        if let Some(path) = &self.options.output_path {
            std::fs::write(path, &document)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write report: {}", path.display()))?;
            println!("{} {}", "Report written to:".green(), path.display());
        } else {
            println!("{}", document);
        }

        Ok(())
    }

    pub fn render(&self, outcome: &ScanOutcome) -> Result<String> {
        match self.format {
            ReportFormat::Markdown => Ok(markdown::render(&outcome.findings)),
            ReportFormat::Json => json::render(outcome),
        }
    }
}
