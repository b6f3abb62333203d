use super::{CancelFlag, Classifier, Finding, ScanOutcome, ScanProgress, Visit};
use crate::config::Config;
use crate::discovery::SourceFile;
use crate::lsp::{Document, LanguageService, LspError, SymbolNode};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How processing of a single file ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    Scanned,
    /// Could not be loaded, or the server had no outline for it
    Skipped,
    /// Walk stopped part way by cancellation; counted nowhere
    Interrupted,
}

/// Walks each file's symbol outline and collects unreferenced symbols.
///
/// Files are processed strictly one after another, and every reference
/// query is awaited before the next symbol is visited.
pub struct Scanner<'a> {
    classifier: Classifier<'a>,
    /// Progress messages show paths relative to this directory
    base: PathBuf,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a Config, base: &Path) -> Self {
        Self {
            classifier: Classifier::new(config),
            base: base.to_path_buf(),
        }
    }

    /// Scan `files` in order. Always returns the findings gathered so far,
    /// also when cancelled or when individual files fail.
    pub async fn scan<S>(
        &self,
        service: &mut S,
        files: &[SourceFile],
        cancel: &CancelFlag,
        progress: &dyn ScanProgress,
    ) -> ScanOutcome
    where
        S: LanguageService + ?Sized,
    {
        let total = files.len();
        let mut outcome = ScanOutcome::new(total);
        progress.start(total);

        for (index, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            let relative = file.relative_to(&self.base);
            progress.advance(
                index + 1,
                &format!("[{}/{}] Scanning {}", index + 1, total, relative),
            );

            match self
                .scan_file(service, file, cancel, &mut outcome.findings)
                .await
            {
                Ok(FileStatus::Scanned) => outcome.files_scanned += 1,
                Ok(FileStatus::Skipped) => outcome.files_skipped += 1,
                Ok(FileStatus::Interrupted) => {
                    debug!("Scan of {} interrupted", relative);
                }
                Err(e) => {
                    warn!("Failed to process file: {}: {}", relative, e);
                    outcome.files_failed += 1;
                }
            }
        }

        outcome.cancelled = cancel.is_cancelled();
        progress.finish(&outcome);

        info!(
            "Scanned {} of {} files, {} unreferenced symbols",
            outcome.files_scanned,
            total,
            outcome.findings.len()
        );
        outcome
    }

    async fn scan_file<S>(
        &self,
        service: &mut S,
        file: &SourceFile,
        cancel: &CancelFlag,
        findings: &mut Vec<Finding>,
    ) -> Result<FileStatus, LspError>
    where
        S: LanguageService + ?Sized,
    {
        let document = match service.open_document(&file.path).await {
            Ok(document) => document,
            Err(e) if e.is_load_failure() => {
                debug!("Skipping {}: {}", file.path.display(), e);
                return Ok(FileStatus::Skipped);
            }
            Err(e) => return Err(e),
        };

        let status = self.walk_document(service, &document, cancel, findings).await;

        if let Err(e) = service.close_document(&document).await {
            debug!("Failed to close {}: {}", file.path.display(), e);
        }
        status
    }

    /// Pre-order walk over the outline with an explicit stack
    async fn walk_document<S>(
        &self,
        service: &mut S,
        document: &Document,
        cancel: &CancelFlag,
        findings: &mut Vec<Finding>,
    ) -> Result<FileStatus, LspError>
    where
        S: LanguageService + ?Sized,
    {
        let Some(symbols) = service.document_symbols(document).await? else {
            debug!("No symbols for {}", document.path.display());
            return Ok(FileStatus::Skipped);
        };

        let mut stack: Vec<SymbolNode> = symbols.into_iter().rev().collect();

        while let Some(symbol) = stack.pop() {
            if cancel.is_cancelled() {
                return Ok(FileStatus::Interrupted);
            }

            match self.classifier.visit(&symbol) {
                Visit::Skip => continue,
                Visit::Descend => {}
                Visit::Check => {
                    let count = service
                        .references(document, symbol.anchor)
                        .await?
                        .map_or(0, |locations| locations.len());

                    if self.classifier.is_unreferenced(count) {
                        debug!(symbol = %symbol.name, references = count, "Unreferenced");
                        findings.push(Finding::from_symbol(&symbol, &document.path));
                    }
                }
            }

            stack.extend(symbol.children.into_iter().rev());
        }

        Ok(FileStatus::Scanned)
    }
}
