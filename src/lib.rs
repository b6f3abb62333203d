//! dartdeadcode - find unreferenced Dart/Flutter symbols
//!
//! Symbol extraction and reference resolution are delegated to a language
//! server; this crate only orchestrates the queries.
//!
//! # Architecture
//!
//! The scan pipeline consists of:
//! 1. **Folder Selection** - Folders from the command line or a prompt
//! 2. **File Discovery** - Enumerate .dart files, minus generated ones
//! 3. **Symbol Walk** - Ask the server for each file's outline and walk it
//! 4. **Classification** - Symbols with at most one reference are dead
//! 5. **Reporting** - Log channel plus a report document

pub mod config;
pub mod discovery;
pub mod lsp;
pub mod report;
pub mod scan;
pub mod select;

pub use config::Config;
pub use discovery::{FileFinder, SourceFile};
pub use lsp::{LanguageService, LspClient, LspError, SymbolNode};
pub use report::{ReportFormat, Reporter};
pub use scan::{CancelFlag, Finding, ScanOutcome, Scanner};
