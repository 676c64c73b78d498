//! Source configuration.
//!
//! The selector hands every gather a [`SourceParams`] (which navigation
//! method to run, and the fixed workspace-symbol query) and a
//! [`SourceOptions`]. The binary additionally reads a [`GatherConfig`] from
//! a JSON file so sessions can be replayed without retyping flags.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-source parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceParams {
    /// Navigation method tag, e.g. `textDocument/definition`.
    pub method: String,
    /// Query for `workspace/symbol` when the source is not volatile.
    pub query: String,
}

/// Options the selector applies to the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceOptions {
    /// Re-gather on every input change; `workspace/symbol` then queries the live input.
    pub volatile: bool,
}

/// Everything the binary needs to run one gather.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatherConfig {
    /// Source parameters.
    pub params: SourceParams,
    /// Source options.
    pub options: SourceOptions,
    /// Language server command.
    pub language_server: String,
    /// Arguments passed to the language server.
    pub language_server_args: Vec<String>,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            params: SourceParams::default(),
            options: SourceOptions::default(),
            language_server: "rust-analyzer".to_string(),
            language_server_args: Vec::new(),
        }
    }
}

/// Loads a [`GatherConfig`] from a JSON file.
///
/// Missing keys fall back to their defaults.
/// ## Errors
/// `Error::Io` if the file cannot be read, `Error::Config` if it is not
/// valid JSON.
pub fn load(path: &Path) -> Result<GatherConfig> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("{} - invalid JSON: {e}", path.display())))
}
