use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a dead symbol scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source file extensions to include (without the dot)
    pub extensions: Vec<String>,

    /// Glob patterns excluded from enumeration
    pub exclude: Vec<String>,

    /// Respect .gitignore / .ignore files while walking
    pub respect_gitignore: bool,

    /// Drop files already enumerated under an earlier folder
    pub deduplicate: bool,

    /// Symbol walk and classification settings
    pub scan: ScanConfig,

    /// Language server settings
    pub server: ServerConfig,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Symbol kinds (lower-case LSP names) that are checked for references
    pub target_kinds: Vec<String>,

    /// Names starting with this prefix are treated as private and skipped
    pub private_prefix: String,

    /// A symbol with at most this many references is reported
    pub max_references: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Command line used to start the language server
    pub command: Vec<String>,

    /// `languageId` sent with `textDocument/didOpen`
    pub language_id: String,

    /// Passed through as `initializationOptions`
    pub initialization_options: Option<serde_json::Value>,

    /// Per-request timeout; no timeout when unset
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: markdown, json
    pub format: String,

    /// Write the report document here instead of stdout
    pub output: Option<PathBuf>,

    /// Write the log channel here instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: vec!["dart".to_string()],
            exclude: vec![
                "**/.dart_tool/**".to_string(),
                "**/*.g.dart".to_string(),
                "**/*.freezed.dart".to_string(),
            ],
            respect_gitignore: true,
            deduplicate: false,
            scan: ScanConfig::default(),
            server: ServerConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_kinds: vec![
                "method".to_string(),
                "constructor".to_string(),
                "field".to_string(),
                "property".to_string(),
                "variable".to_string(),
            ],
            private_prefix: "_".to_string(),
            max_references: 1,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "dart".to_string(),
                "language-server".to_string(),
                "--protocol=lsp".to_string(),
            ],
            language_id: "dart".to_string(),
            initialization_options: None,
            request_timeout_secs: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
            output: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".deadcode.yml",
            ".deadcode.yaml",
            ".deadcode.toml",
            "deadcode.yml",
            "deadcode.yaml",
            "deadcode.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Whether a symbol name is private by naming convention
    pub fn is_private(&self, name: &str) -> bool {
        !self.scan.private_prefix.is_empty() && name.starts_with(&self.scan.private_prefix)
    }

    /// Whether a lower-case symbol kind is checked for references
    pub fn is_target_kind(&self, kind: &str) -> bool {
        self.scan.target_kinds.iter().any(|k| k.eq_ignore_ascii_case(kind))
    }

    /// Display label for the configured extensions, e.g. ".dart"
    pub fn extensions_label(&self) -> String {
        self.extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join("/")
    }
}
