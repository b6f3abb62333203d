use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the language server
#[derive(Error, Debug)]
pub enum LspError {
    #[error("Language server command is empty")]
    EmptyCommand,

    #[error("Failed to start language server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{method} failed with code {code}: {message}")]
    Server {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Language server closed the connection")]
    Closed,

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Cannot express {} as a file URI", .0.display())]
    InvalidPath(PathBuf),
}

impl LspError {
    /// The file itself could not be loaded; the server was never involved
    pub fn is_load_failure(&self) -> bool {
        matches!(self, LspError::Load { .. } | LspError::InvalidPath(_))
    }
}
