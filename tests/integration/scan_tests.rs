//! Integration tests for the symbol walk and classification
//!
//! A scripted language service stands in for the real server so that each
//! outline and reference count is known up front.

use async_trait::async_trait;
use dartdeadcode::config::Config;
use dartdeadcode::discovery::SourceFile;
use dartdeadcode::lsp::{Document, LanguageService, LspError, SymbolNode};
use dartdeadcode::scan::{CancelFlag, Finding, ScanOutcome, ScanProgress, Scanner, SilentProgress};
use lsp_types::{Location, Position, Range, SymbolKind};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const BASE: &str = "/project";

fn source(rel: &str) -> SourceFile {
    SourceFile::new(Path::new(BASE).join(rel), PathBuf::from(BASE))
}

fn method(name: &str, line: u32) -> SymbolNode {
    SymbolNode::new(name, SymbolKind::METHOD, line, 2)
}

fn class(name: &str, line: u32, children: Vec<SymbolNode>) -> SymbolNode {
    SymbolNode::new(name, SymbolKind::CLASS, line, 6).with_children(children)
}

/// Language service answering from fixed tables
#[derive(Default)]
struct ScriptedService {
    /// Outline per file; files missing here have no outline
    outlines: HashMap<PathBuf, Vec<SymbolNode>>,
    /// Reference count per (file, line); missing means a `null` answer
    references: HashMap<(PathBuf, u32), usize>,
    /// Files whose outline request fails
    failing: HashSet<PathBuf>,
    /// Files that cannot be loaded
    unreadable: HashSet<PathBuf>,
    /// Files whose load notification hits a closed connection
    disconnected: HashSet<PathBuf>,
    /// Raise this flag after the given number of reference queries
    cancel_after: Option<(usize, CancelFlag)>,
    /// Every query, in order
    log: Vec<String>,
    closed: Vec<PathBuf>,
}

impl ScriptedService {
    fn outline(mut self, rel: &str, symbols: Vec<SymbolNode>) -> Self {
        self.outlines.insert(Path::new(BASE).join(rel), symbols);
        self
    }

    fn refs(mut self, rel: &str, line: u32, count: usize) -> Self {
        self.references.insert((Path::new(BASE).join(rel), line), count);
        self
    }

    fn reference_queries(&self) -> usize {
        self.log.iter().filter(|l| l.starts_with("references")).count()
    }
}

#[async_trait]
impl LanguageService for ScriptedService {
    async fn open_document(&mut self, path: &Path) -> Result<Document, LspError> {
        self.log.push(format!("open {}", path.display()));
        if self.unreadable.contains(path) {
            return Err(LspError::Load {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            });
        }
        if self.disconnected.contains(path) {
            return Err(LspError::Closed);
        }
        Document::new(path)
    }

    async fn document_symbols(
        &mut self,
        document: &Document,
    ) -> Result<Option<Vec<SymbolNode>>, LspError> {
        self.log.push(format!("symbols {}", document.path.display()));
        if self.failing.contains(&document.path) {
            return Err(LspError::Server {
                method: "textDocument/documentSymbol".to_string(),
                code: -32603,
                message: "analysis crashed".to_string(),
            });
        }
        Ok(self.outlines.get(&document.path).cloned())
    }

    async fn references(
        &mut self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>, LspError> {
        self.log.push(format!(
            "references {}:{}",
            document.path.display(),
            position.line
        ));

        if let Some((after, flag)) = &self.cancel_after {
            if self.reference_queries() >= *after {
                flag.cancel();
            }
        }

        Ok(self
            .references
            .get(&(document.path.clone(), position.line))
            .map(|count| {
                vec![Location::new(document.uri.clone(), Range::new(position, position)); *count]
            }))
    }

    async fn close_document(&mut self, document: &Document) -> Result<(), LspError> {
        self.closed.push(document.path.clone());
        Ok(())
    }
}

/// Records progress messages
#[derive(Default)]
struct RecordingProgress {
    messages: RefCell<Vec<String>>,
    finished: RefCell<Option<bool>>,
}

impl ScanProgress for RecordingProgress {
    fn start(&self, _total: usize) {}

    fn advance(&self, _index: usize, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }

    fn finish(&self, outcome: &ScanOutcome) {
        *self.finished.borrow_mut() = Some(outcome.cancelled);
    }
}

async fn run(config: &Config, service: &mut ScriptedService, files: &[SourceFile]) -> ScanOutcome {
    Scanner::new(config, Path::new(BASE))
        .scan(service, files, &CancelFlag::new(), &SilentProgress)
        .await
}

fn names(outcome: &ScanOutcome) -> Vec<&str> {
    outcome.findings.iter().map(|f| f.name.as_str()).collect()
}

// ============================================================================
// Classification
// ============================================================================

#[tokio::test]
async fn test_self_only_reference_is_reported_once_with_one_based_line() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline("lib/a.dart", vec![method("unused", 9), method("used", 20)])
        .refs("lib/a.dart", 9, 1)
        .refs("lib/a.dart", 20, 3);

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    assert_eq!(
        outcome.findings,
        vec![Finding::new("unused", PathBuf::from("/project/lib/a.dart"), 10, "method")]
    );
    assert_eq!(outcome.files_scanned, 1);
}

#[tokio::test]
async fn test_zero_and_null_references_are_reported() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline(
            "lib/a.dart",
            vec![
                method("orphan", 1),
                SymbolNode::new("nothingKnown", SymbolKind::FIELD, 2, 2),
            ],
        )
        .refs("lib/a.dart", 1, 0);

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    assert_eq!(names(&outcome), vec!["orphan", "nothingKnown"]);
    assert_eq!(outcome.findings[1].kind, "field");
}

#[tokio::test]
async fn test_private_symbols_are_never_reported_nor_descended() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline(
            "lib/a.dart",
            vec![
                method("_helper", 1),
                class("_HomeState", 3, vec![method("build", 4), method("dispose", 8)]),
            ],
        )
        .refs("lib/a.dart", 1, 1);

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    assert!(outcome.findings.is_empty());
    assert_eq!(service.reference_queries(), 0);
}

#[tokio::test]
async fn test_non_target_kinds_are_not_reported_but_children_are_visited() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline(
            "lib/a.dart",
            vec![
                class("Counter", 0, vec![method("increment", 2)]),
                SymbolNode::new("main", SymbolKind::FUNCTION, 10, 5),
            ],
        )
        .refs("lib/a.dart", 0, 0)
        .refs("lib/a.dart", 2, 1)
        .refs("lib/a.dart", 10, 0);

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    assert_eq!(names(&outcome), vec!["increment"]);
    // Classes and functions are never queried
    assert_eq!(service.reference_queries(), 1);
}

#[tokio::test]
async fn test_constructors_properties_and_variables_are_targets() {
    let config = Config::default();
    let mut service = ScriptedService::default().outline(
        "lib/a.dart",
        vec![class(
            "Model",
            0,
            vec![
                SymbolNode::new("Model", SymbolKind::CONSTRUCTOR, 1, 2),
                SymbolNode::new("title", SymbolKind::PROPERTY, 2, 2),
                SymbolNode::new("counter", SymbolKind::VARIABLE, 3, 2),
                SymbolNode::new("Status", SymbolKind::ENUM, 4, 2),
            ],
        )],
    );

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    let kinds: Vec<_> = outcome.findings.iter().map(|f| f.kind.as_str()).collect();
    assert_eq!(kinds, vec!["constructor", "property", "variable"]);
}

#[tokio::test]
async fn test_max_references_threshold_is_configurable() {
    let mut config = Config::default();
    config.scan.max_references = 0;
    let mut service = ScriptedService::default()
        .outline("lib/a.dart", vec![method("selfOnly", 1), method("orphan", 2)])
        .refs("lib/a.dart", 1, 1)
        .refs("lib/a.dart", 2, 0);

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    assert_eq!(names(&outcome), vec!["orphan"]);
}

// ============================================================================
// Traversal order
// ============================================================================

#[tokio::test]
async fn test_findings_follow_file_then_preorder_order() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline(
            "lib/a.dart",
            vec![
                class(
                    "Outer",
                    0,
                    vec![
                        method("first", 1),
                        class("Inner", 2, vec![method("second", 3)]),
                        method("third", 5),
                    ],
                ),
                method("fourth", 8),
            ],
        )
        .outline("lib/b.dart", vec![method("fifth", 0)]);

    let files = [source("lib/a.dart"), source("lib/b.dart")];
    let outcome = run(&config, &mut service, &files).await;

    assert_eq!(
        names(&outcome),
        vec!["first", "second", "third", "fourth", "fifth"]
    );
    assert_eq!(outcome.findings[4].file, PathBuf::from("/project/lib/b.dart"));
}

#[tokio::test]
async fn test_repeated_scans_are_identical() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline("lib/a.dart", vec![class("A", 0, vec![method("x", 1), method("y", 2)])])
        .outline("lib/b.dart", vec![method("z", 0)])
        .refs("lib/a.dart", 2, 4);
    let files = [source("lib/a.dart"), source("lib/b.dart")];

    let first = run(&config, &mut service, &files).await;
    let second = run(&config, &mut service, &files).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_flat_outline_is_classified() {
    let config = Config::default();
    let response: lsp_types::DocumentSymbolResponse = serde_json::from_value(serde_json::json!([
        {
            "name": "unusedField",
            "kind": 8,
            "location": {
                "uri": "file:///project/lib/a.dart",
                "range": {"start": {"line": 6, "character": 2}, "end": {"line": 6, "character": 13}}
            }
        }
    ]))
    .unwrap();
    let mut service = ScriptedService::default().outline(
        "lib/a.dart",
        dartdeadcode::lsp::symbols_from_response(response),
    );

    let outcome = run(&config, &mut service, &[source("lib/a.dart")]).await;

    assert_eq!(
        outcome.findings,
        vec![Finding::new("unusedField", PathBuf::from("/project/lib/a.dart"), 7, "field")]
    );
}

// ============================================================================
// Skips, failures and cancellation
// ============================================================================

#[tokio::test]
async fn test_unloadable_and_outline_less_files_are_skipped() {
    let config = Config::default();
    let mut service = ScriptedService::default().outline("lib/c.dart", vec![method("c", 0)]);
    service.unreadable.insert(PathBuf::from("/project/lib/a.dart"));

    let files = [source("lib/a.dart"), source("lib/b.dart"), source("lib/c.dart")];
    let outcome = run(&config, &mut service, &files).await;

    assert_eq!(outcome.files_skipped, 2);
    assert_eq!(outcome.files_scanned, 1);
    assert_eq!(names(&outcome), vec!["c"]);
    // b.dart was opened, so it is closed again; a.dart never was
    assert_eq!(
        service.closed,
        vec![PathBuf::from("/project/lib/b.dart"), PathBuf::from("/project/lib/c.dart")]
    );
}

#[tokio::test]
async fn test_failing_file_does_not_stop_the_scan() {
    let config = Config::default();
    let mut service = ScriptedService::default()
        .outline("lib/a.dart", vec![method("a", 0)])
        .outline("lib/b.dart", vec![method("b", 0)]);
    service.failing.insert(PathBuf::from("/project/lib/a.dart"));

    let files = [source("lib/a.dart"), source("lib/b.dart")];
    let outcome = run(&config, &mut service, &files).await;

    assert_eq!(outcome.files_failed, 1);
    assert_eq!(names(&outcome), vec!["b"]);
    assert!(!outcome.cancelled);
}

#[tokio::test]
async fn test_transport_error_on_load_is_a_failure_not_a_skip() {
    let config = Config::default();
    let mut service = ScriptedService::default().outline("lib/b.dart", vec![method("b", 0)]);
    service.disconnected.insert(PathBuf::from("/project/lib/a.dart"));

    let files = [source("lib/a.dart"), source("lib/b.dart")];
    let outcome = run(&config, &mut service, &files).await;

    assert_eq!(outcome.files_failed, 1);
    assert_eq!(outcome.files_skipped, 0);
    assert_eq!(outcome.files_scanned, 1);
    assert_eq!(names(&outcome), vec!["b"]);
}

#[tokio::test]
async fn test_cancel_before_start_yields_empty_outcome() {
    let config = Config::default();
    let mut service = ScriptedService::default().outline("lib/a.dart", vec![method("a", 0)]);
    let cancel = CancelFlag::new();
    cancel.cancel();
    let progress = RecordingProgress::default();

    let outcome = Scanner::new(&config, Path::new(BASE))
        .scan(&mut service, &[source("lib/a.dart")], &cancel, &progress)
        .await;

    assert!(outcome.findings.is_empty());
    assert!(outcome.cancelled);
    assert!(service.log.is_empty());
    assert!(progress.messages.borrow().is_empty());
    assert_eq!(*progress.finished.borrow(), Some(true));
}

#[tokio::test]
async fn test_cancel_mid_file_keeps_earlier_findings() {
    let config = Config::default();
    let cancel = CancelFlag::new();
    let mut service = ScriptedService::default()
        .outline("lib/a.dart", vec![method("a1", 0), method("a2", 1), method("a3", 2)])
        .outline("lib/b.dart", vec![method("b", 0)]);
    service.cancel_after = Some((1, cancel.clone()));

    let files = [source("lib/a.dart"), source("lib/b.dart")];
    let outcome = Scanner::new(&config, Path::new(BASE))
        .scan(&mut service, &files, &cancel, &SilentProgress)
        .await;

    assert_eq!(names(&outcome), vec!["a1"]);
    assert!(outcome.cancelled);
    assert_eq!(service.reference_queries(), 1);
    // a.dart was cut short, so it counts as neither scanned nor skipped
    assert_eq!(outcome.files_scanned, 0);
    assert_eq!(outcome.files_skipped, 0);
    assert_eq!(outcome.files_failed, 0);
    assert_eq!(service.closed, vec![PathBuf::from("/project/lib/a.dart")]);
    assert!(!service.log.iter().any(|l| l.contains("b.dart")));
}

#[tokio::test]
async fn test_progress_messages_use_relative_paths() {
    let config = Config::default();
    let mut service = ScriptedService::default();
    let progress = RecordingProgress::default();
    let files = [source("lib/a.dart"), source("test/a_test.dart")];

    Scanner::new(&config, Path::new(BASE))
        .scan(&mut service, &files, &CancelFlag::new(), &progress)
        .await;

    assert_eq!(
        *progress.messages.borrow(),
        vec![
            "[1/2] Scanning lib/a.dart".to_string(),
            "[2/2] Scanning test/a_test.dart".to_string(),
        ]
    );
    assert_eq!(*progress.finished.borrow(), Some(false));
}
