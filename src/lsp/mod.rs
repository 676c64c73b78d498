//! LSP (Language Server Protocol) plumbing.
//!
//! - `client`: a concrete language client speaking to one spawned server
//! - `types`: coordinate, URI and symbol-kind conversions
//!
//! The gather pipeline in [`crate::source`] only depends on the
//! [`crate::source::LanguageClient`] trait; [`client::LspClient`] is one
//! implementation of it.

pub mod client;
pub mod types;

use crate::error::LspError;

/// Result type for LSP operations.
pub type LspResult<T> = std::result::Result<T, LspError>;

pub use lsp_types::{
    CallHierarchyItem, Location, LocationLink, Position, Range, SymbolKind,
    TextDocumentIdentifier, Url,
};
