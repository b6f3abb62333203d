use crate::config::Config;
use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Represents a discovered source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Selected folder the file was found under
    pub root: PathBuf,
}

impl SourceFile {
    pub fn new(path: PathBuf, root: PathBuf) -> Self {
        Self { path, root }
    }

    /// Path relative to `base` if it lives underneath it, otherwise the full path
    pub fn relative_to(&self, base: &Path) -> String {
        self.path
            .strip_prefix(base)
            .unwrap_or(&self.path)
            .display()
            .to_string()
    }
}

/// File finder for enumerating source files under the selected folders
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Enumerate source files under each folder, in folder order.
    ///
    /// Results are concatenated as-is; a file reachable from two overlapping
    /// folders appears twice unless `deduplicate` is set.
    pub fn find_files(&self, folders: &[PathBuf]) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for folder in folders {
            let root = match std::fs::canonicalize(folder) {
                Ok(root) if root.is_dir() => root,
                Ok(_) | Err(_) => {
                    warn!("Skipping {}: not a directory", folder.display());
                    continue;
                }
            };

            debug!("Scanning for files in: {}", root.display());
            files.extend(self.scan_directory(&root)?);
        }

        if self.config.deduplicate {
            let mut seen = HashSet::new();
            files.retain(|f| seen.insert(f.path.clone()));
        }

        debug!("Found {} files", files.len());
        Ok(files)
    }

    /// Scan a single directory for source files
    fn scan_directory(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let overrides = self.build_overrides(root)?;

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .ignore(self.config.respect_gitignore)
            .parents(self.config.respect_gitignore)
            .follow_links(false)
            .overrides(overrides)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let files = walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|entry| self.has_source_extension(entry.path()))
            .map(|entry| {
                trace!("Found: {}", entry.path().display());
                SourceFile::new(entry.path().to_path_buf(), root.to_path_buf())
            })
            .collect();

        Ok(files)
    }

    /// Turn the exclusion globs into ignore-overrides rooted at `root`
    fn build_overrides(&self, root: &Path) -> Result<Override> {
        let mut builder = OverrideBuilder::new(root);
        for pattern in &self.config.exclude {
            builder
                .add(&format!("!{}", pattern))
                .into_diagnostic()
                .wrap_err_with(|| format!("Invalid exclude pattern: {}", pattern))?;
        }
        builder.build().into_diagnostic()
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.config.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}
