use crate::config::Config;
use crate::lsp::SymbolNode;

/// What the walker does with one symbol node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Private by name; neither checked nor descended into
    Skip,
    /// Not a target kind; only its children are visited
    Descend,
    /// Target kind; query references, then visit children
    Check,
}

/// Decides which symbols are checked and which counts mean "unreferenced"
pub struct Classifier<'a> {
    config: &'a Config,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn visit(&self, symbol: &SymbolNode) -> Visit {
        // Private names are assumed used within their own file; unverified
        if self.config.is_private(&symbol.name) {
            Visit::Skip
        } else if self.config.is_target_kind(symbol.kind_name()) {
            Visit::Check
        } else {
            Visit::Descend
        }
    }

    /// The declaration counts as one reference, so the default threshold of 1
    /// reports both orphaned and self-only symbols
    pub fn is_unreferenced(&self, reference_count: usize) -> bool {
        reference_count <= self.config.scan.max_references
    }
}
