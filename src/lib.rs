//! lsp-nav-source
//!
//! A selector source that asks a language server for semantic navigation
//! results (definitions, references, symbols, call hierarchies) and turns
//! the protocol's many response shapes into one uniform list of
//! selectable, navigable items.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  gather(args)   ┌─────────────────┐
//! │  Selector UI    │◄───────────────►│     Source      │
//! │   (consumer)    │  Vec<Item>      │  normalize/tree │
//! └─────────────────┘                 └────────┬────────┘
//!                                              │ LanguageClient
//!                                       ┌──────▼──────┐
//!                                       │  LspClient  │
//!                                       └──────┬──────┘
//!                                              │ JSON-RPC
//!                                       ┌──────▼────────┐
//!                                       │   Language    │
//!                                       │    Server     │
//!                                       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`error`] - Error types and terminal-condition reason codes
//! - [`config`] - Source parameters and the JSON configuration file
//! - [`lsp`] - Concrete LSP client and protocol conversions
//! - [`source`] - The gather pipeline and call hierarchy trees

// Enforce documentation and other quality attributes
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are too strict
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod lsp;
pub mod source;

// Re-export commonly used types at the crate root
pub use error::{Error, GatherError, Result};
pub use source::{GatherArgs, Item, Source};
