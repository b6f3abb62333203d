use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use dartdeadcode::config::Config;
use dartdeadcode::discovery::FileFinder;
use dartdeadcode::lsp::ProcessClient;
use dartdeadcode::report::{ReportFormat, ReportOptions, Reporter};
use dartdeadcode::scan::{BarProgress, CancelFlag, ScanProgress, Scanner, SilentProgress};
use dartdeadcode::select::{FolderPicker, GivenFolders, InteractivePicker};

/// dartdeadcode - Find unreferenced Dart/Flutter symbols via the language server
#[derive(Parser, Debug)]
#[command(name = "dartdeadcode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folders to scan; prompts for a selection when omitted
    folders: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root: config lookup, relative paths and language server workspace
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Additional exclude globs (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Source file extensions to scan, replacing the configured ones
    #[arg(long, value_name = "EXT")]
    extension: Vec<String>,

    /// Language server command line, e.g. "dart language-server --protocol=lsp"
    #[arg(long, value_name = "CMD")]
    server: Option<String>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report document to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the log channel to a file (cleared on every run)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Report symbols with at most this many references
    #[arg(long, value_name = "N")]
    max_references: Option<usize>,

    /// Scan each file once even if selected folders overlap
    #[arg(long)]
    dedupe: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output the report
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Markdown,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("dartdeadcode v{}", env!("CARGO_PKG_VERSION"));

    let root = std::fs::canonicalize(&cli.root)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid project root: {}", cli.root.display()))?;

    let config = load_config(&cli, &root)?;

    run_scan(&config, &cli, &root).await
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli, root: &Path) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(root)?
    };

    // Override with CLI arguments
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if !cli.extension.is_empty() {
        config.extensions = cli
            .extension
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
    }
    if let Some(server) = &cli.server {
        config.server.command = server.split_whitespace().map(String::from).collect();
    }
    if let Some(max) = cli.max_references {
        config.scan.max_references = max;
    }
    if cli.dedupe {
        config.deduplicate = true;
    }
    if cli.timeout.is_some() {
        config.server.request_timeout_secs = cli.timeout;
    }
    if cli.output.is_some() {
        config.report.output = cli.output.clone();
    }
    if cli.log_file.is_some() {
        config.report.log_file = cli.log_file.clone();
    }
    if let Some(format) = cli.format {
        config.report.format = match format {
            OutputFormat::Markdown => "markdown".to_string(),
            OutputFormat::Json => "json".to_string(),
        };
    }

    Ok(config)
}

async fn run_scan(config: &Config, cli: &Cli, root: &Path) -> Result<()> {
    let format: ReportFormat = config
        .report
        .format
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    // Step 1: Pick folders
    let picker: Box<dyn FolderPicker> = if cli.folders.is_empty() {
        Box::new(InteractivePicker::new(root))
    } else {
        Box::new(GivenFolders(cli.folders.clone()))
    };
    let folders = picker.pick()?;

    if folders.is_empty() {
        println!("{}", "No folders selected – aborting.".yellow());
        return Ok(());
    }

    // Step 2: Enumerate files
    info!("Discovering files...");
    let files = FileFinder::new(config).find_files(&folders)?;
    info!("Found {} files to scan", files.len());

    if files.is_empty() {
        println!(
            "{}",
            format!(
                "No {} files found in the selected folders.",
                config.extensions_label()
            )
            .yellow()
        );
        return Ok(());
    }

    // Step 3: Walk symbols through the language server
    let mut client = ProcessClient::spawn(&config.server, root)
        .await
        .into_diagnostic()
        .wrap_err("Failed to start the language server")?;

    let cancel = CancelFlag::new();
    cancel.cancel_on_ctrl_c();

    let progress: Box<dyn ScanProgress> = if cli.quiet {
        Box::new(SilentProgress)
    } else {
        Box::new(BarProgress::new())
    };

    let outcome = Scanner::new(config, root)
        .scan(&mut client, &files, &cancel, progress.as_ref())
        .await;

    if outcome.files_failed > 0 {
        warn!("{} files could not be processed", outcome.files_failed);
    }

    if let Err(e) = client.shutdown().await {
        warn!("Language server did not shut down cleanly: {}", e);
    }

    // Step 4: Report
    let reporter = Reporter::new(
        format,
        ReportOptions {
            output_path: config.report.output.clone(),
            log_path: config.report.log_file.clone(),
            quiet: cli.quiet,
        },
    );
    reporter.report(&outcome)
}
