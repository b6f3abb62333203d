use super::LspError;
use async_trait::async_trait;
use lsp_types::{
    DocumentSymbol, DocumentSymbolResponse, Location, Position, SymbolInformation, SymbolKind, Url,
};
use std::path::{Path, PathBuf};

/// A source file that has been loaded into the language service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub uri: Url,
}

impl Document {
    pub fn new(path: &Path) -> Result<Self, LspError> {
        let uri = Url::from_file_path(path).map_err(|_| LspError::InvalidPath(path.to_path_buf()))?;
        Ok(Self {
            path: path.to_path_buf(),
            uri,
        })
    }
}

/// One node of a file's symbol outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNode {
    pub name: String,
    pub kind: SymbolKind,
    /// Start of the declaration name; the key for reference queries
    pub anchor: Position,
    pub children: Vec<SymbolNode>,
}

impl SymbolNode {
    pub fn new(name: impl Into<String>, kind: SymbolKind, line: u32, character: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            anchor: Position::new(line, character),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SymbolNode>) -> Self {
        self.children = children;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        symbol_kind_name(self.kind)
    }
}

impl From<DocumentSymbol> for SymbolNode {
    fn from(symbol: DocumentSymbol) -> Self {
        Self {
            name: symbol.name,
            kind: symbol.kind,
            anchor: symbol.selection_range.start,
            children: symbol
                .children
                .unwrap_or_default()
                .into_iter()
                .map(SymbolNode::from)
                .collect(),
        }
    }
}

impl From<SymbolInformation> for SymbolNode {
    fn from(symbol: SymbolInformation) -> Self {
        Self {
            name: symbol.name,
            kind: symbol.kind,
            anchor: symbol.location.range.start,
            children: Vec::new(),
        }
    }
}

/// Flatten either outline shape into symbol trees
pub fn symbols_from_response(response: DocumentSymbolResponse) -> Vec<SymbolNode> {
    match response {
        DocumentSymbolResponse::Nested(symbols) => {
            symbols.into_iter().map(SymbolNode::from).collect()
        }
        DocumentSymbolResponse::Flat(symbols) => {
            symbols.into_iter().map(SymbolNode::from).collect()
        }
    }
}

/// Lower-case name of a symbol kind, e.g. `method`, `enummember`
pub fn symbol_kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::FILE => "file",
        SymbolKind::MODULE => "module",
        SymbolKind::NAMESPACE => "namespace",
        SymbolKind::PACKAGE => "package",
        SymbolKind::CLASS => "class",
        SymbolKind::METHOD => "method",
        SymbolKind::PROPERTY => "property",
        SymbolKind::FIELD => "field",
        SymbolKind::CONSTRUCTOR => "constructor",
        SymbolKind::ENUM => "enum",
        SymbolKind::INTERFACE => "interface",
        SymbolKind::FUNCTION => "function",
        SymbolKind::VARIABLE => "variable",
        SymbolKind::CONSTANT => "constant",
        SymbolKind::STRING => "string",
        SymbolKind::NUMBER => "number",
        SymbolKind::BOOLEAN => "boolean",
        SymbolKind::ARRAY => "array",
        SymbolKind::OBJECT => "object",
        SymbolKind::KEY => "key",
        SymbolKind::NULL => "null",
        SymbolKind::ENUM_MEMBER => "enummember",
        SymbolKind::STRUCT => "struct",
        SymbolKind::EVENT => "event",
        SymbolKind::OPERATOR => "operator",
        SymbolKind::TYPE_PARAMETER => "typeparameter",
        _ => "other",
    }
}

/// The symbol and reference queries a scan needs from a language server
#[async_trait]
pub trait LanguageService: Send {
    /// Load a file so that symbol queries can be made against it
    async fn open_document(&mut self, path: &Path) -> Result<Document, LspError>;

    /// Symbol outline of a loaded document, `None` if the server has none
    async fn document_symbols(
        &mut self,
        document: &Document,
    ) -> Result<Option<Vec<SymbolNode>>, LspError>;

    /// Reference locations for the symbol at `position`, declaration included
    async fn references(
        &mut self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>, LspError>;

    /// Release a document opened with `open_document`
    async fn close_document(&mut self, _document: &Document) -> Result<(), LspError> {
        Ok(())
    }
}
