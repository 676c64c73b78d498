//! Buffer and cursor identity.
//!
//! Turns host handles into the identifiers the protocol understands: a
//! document URI for a buffer, a 0-indexed position for a window's cursor.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use lsp_types::{Position, TextDocumentIdentifier};
use serde::{Deserialize, Serialize};

use crate::error::LspError;
use crate::lsp::LspResult;
use crate::lsp::types::{buffer_name_to_url, to_lsp_position};

/// Host handle of a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host handle of a window showing a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

/// Editor-side queries the pipeline needs.
#[async_trait]
pub trait Host: Send + Sync {
    /// Absolute path (or URI-shaped name) of the buffer, `None` if the
    /// query fails.
    async fn buffer_path(&self, buffer: BufferId) -> Option<String>;

    /// 1-indexed `(line, column)` of the window's cursor.
    async fn cursor(&self, window: WindowId) -> Option<(u32, u32)>;
}

/// Resolves the document identifier of a buffer.
/// ## Errors
/// `LspError::DocumentNotFound` when the host cannot name the buffer or the
/// name is neither an absolute path nor a URI.
pub async fn resolve_document(
    host: &dyn Host,
    buffer: BufferId,
) -> LspResult<TextDocumentIdentifier> {
    let name = host
        .buffer_path(buffer)
        .await
        .ok_or_else(|| LspError::DocumentNotFound(format!("buffer {buffer} has no path")))?;
    let uri = buffer_name_to_url(&name)?;
    Ok(TextDocumentIdentifier { uri })
}

/// Resolves the protocol position of a window's cursor.
/// ## Errors
/// `LspError::InvalidPosition` when the host reports no cursor or a zero coordinate.
pub async fn resolve_position(host: &dyn Host, window: WindowId) -> LspResult<Position> {
    let (line, column) = host
        .cursor(window)
        .await
        .ok_or(LspError::InvalidPosition { line: 0, column: 0 })?;
    to_lsp_position(line, column)
}

/// A host with one file open and a fixed cursor.
#[derive(Debug, Clone)]
pub struct FileHost {
    path: PathBuf,
    cursor: (u32, u32),
}

impl FileHost {
    /// Creates a host showing `path` with the cursor at 1-indexed `(line, column)`.
    pub fn new(path: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            cursor: (line, column),
        }
    }
}

#[async_trait]
impl Host for FileHost {
    async fn buffer_path(&self, _buffer: BufferId) -> Option<String> {
        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir().ok()?.join(&self.path)
        };
        Some(path.display().to_string())
    }

    async fn cursor(&self, _window: WindowId) -> Option<(u32, u32)> {
        Some(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_position_is_zero_indexed() {
        let host = FileHost::new("/tmp/project/src/lib.rs", 5, 3);
        let position = resolve_position(&host, WindowId(1000)).await.unwrap();
        assert_eq!(position, Position::new(4, 2));
    }

    #[tokio::test]
    async fn test_resolve_document_absolute_path() {
        let host = FileHost::new("/tmp/project/src/lib.rs", 1, 1);
        let doc = resolve_document(&host, BufferId(1)).await.unwrap();
        assert_eq!(doc.uri.as_str(), "file:///tmp/project/src/lib.rs");
    }

    #[tokio::test]
    async fn test_zero_cursor_rejected() {
        let host = FileHost::new("/tmp/project/src/lib.rs", 0, 1);
        assert!(resolve_position(&host, WindowId(1000)).await.is_err());
    }
}
