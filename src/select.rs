//! Folder selection

use dialoguer::{theme::ColorfulTheme, MultiSelect};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Chooses the root folders to scan. An empty result means "abort".
pub trait FolderPicker {
    fn pick(&self) -> Result<Vec<PathBuf>>;
}

/// Folders passed on the command line
pub struct GivenFolders(pub Vec<PathBuf>);

impl FolderPicker for GivenFolders {
    fn pick(&self) -> Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

/// Multi-select prompt over the base directory and its subdirectories
pub struct InteractivePicker {
    base: PathBuf,
}

impl InteractivePicker {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    /// The base directory itself, then its non-hidden subdirectories by name
    pub fn candidates(&self) -> Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.base)
            .into_diagnostic()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.path())
            .collect();
        dirs.sort();

        let mut candidates = vec![self.base.clone()];
        candidates.extend(dirs);
        Ok(candidates)
    }

    fn label(&self, dir: &Path) -> String {
        match dir.strip_prefix(&self.base) {
            Ok(rel) if rel.as_os_str().is_empty() => ". (current directory)".to_string(),
            Ok(rel) => rel.display().to_string(),
            Err(_) => dir.display().to_string(),
        }
    }
}

impl FolderPicker for InteractivePicker {
    fn pick(&self) -> Result<Vec<PathBuf>> {
        if !console::user_attended() || !console::user_attended_stderr() {
            debug!("Not attached to a terminal; no folders can be picked interactively");
            return Ok(Vec::new());
        }

        let candidates = self.candidates()?;
        let labels: Vec<String> = candidates.iter().map(|d| self.label(d)).collect();

        let selection = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Select folder(s) to scan for unreferenced symbols")
            .items(&labels)
            .interact_opt()
            .into_diagnostic()?;

        Ok(selection
            .unwrap_or_default()
            .into_iter()
            .map(|i| candidates[i].clone())
            .collect())
    }
}
