use crate::lsp::SymbolNode;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A symbol whose only reference is its own declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub name: String,
    /// Absolute path of the declaring file
    pub file: PathBuf,
    /// 1-based declaration line
    pub line: u32,
    /// Lower-case symbol kind, e.g. `method`
    pub kind: String,
}

impl Finding {
    pub fn new(name: impl Into<String>, file: PathBuf, line: u32, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file,
            line,
            kind: kind.into(),
        }
    }

    pub fn from_symbol(symbol: &SymbolNode, file: &Path) -> Self {
        Self::new(
            symbol.name.clone(),
            file.to_path_buf(),
            symbol.anchor.line + 1,
            symbol.kind_name(),
        )
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.file.display(),
            self.line,
            self.name,
            self.kind
        )
    }
}

/// Everything a scan produced, including files it could not finish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    pub files_total: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub cancelled: bool,
}

impl ScanOutcome {
    pub fn new(files_total: usize) -> Self {
        Self {
            files_total,
            ..Default::default()
        }
    }
}
