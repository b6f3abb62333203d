mod loader;

pub use loader::{Config, ReportConfig, ScanConfig, ServerConfig};
