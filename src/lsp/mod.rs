//! Language server access.
//!
//! The scan only ever talks to [`LanguageService`]; [`LspClient`] is the
//! implementation that drives a real server over stdio.

mod client;
mod error;
mod service;
pub mod transport;

pub use client::{LspClient, ProcessClient};
pub use error::LspError;
pub use service::{
    symbol_kind_name, symbols_from_response, Document, LanguageService, SymbolNode,
};
