//! Conversions between host-side and protocol-side coordinates.
//!
//! The host speaks filesystem paths and 1-indexed cursors; the protocol
//! speaks URIs and 0-indexed positions. Everything crossing that boundary
//! goes through this module.

use std::path::Path;

use lsp_types::{Position, SymbolKind, Url};

use crate::error::LspError;

use super::LspResult;

/// Width the bracketed kind label is padded to.
const KIND_LABEL_WIDTH: usize = 15;

/// Converts a buffer name to a document URI.
///
/// Absolute paths become `file:` URIs. Anything else is taken to already be
/// a URI (`deno:/...`, `jdt://...`) and passed through unchanged.
/// ## Errors
/// `LspError::DocumentNotFound` if the name is neither.
pub fn buffer_name_to_url(name: &str) -> LspResult<Url> {
    let path = Path::new(name);
    if path.is_absolute() {
        Url::from_file_path(path)
            .map_err(|()| LspError::DocumentNotFound(format!("invalid path: {name}")))
    } else {
        Url::parse(name)
            .map_err(|e| LspError::DocumentNotFound(format!("'{name}' is not a URI: {e}")))
    }
}

/// Converts a path to a `file:` URI, resolving it against the current
/// directory first.
/// ## Errors
/// `LspError::DocumentNotFound` if the current directory cannot be read,
/// the path cannot be canonicalized (it does not exist), or the canonical
/// path has no `file:` URI form.
pub fn path_to_url(path: &Path) -> LspResult<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| {
                LspError::DocumentNotFound(format!("failed to get current directory: {e}"))
            })?
            .join(path)
    };

    let canonical = absolute.canonicalize().map_err(|e| {
        LspError::DocumentNotFound(format!(
            "failed to canonicalize path '{}': {}",
            path.display(),
            e
        ))
    })?;

    Url::from_file_path(&canonical)
        .map_err(|()| LspError::DocumentNotFound(format!("invalid path: {}", canonical.display())))
}

/// Renders a URI the way items show it: the filesystem path for `file:`
/// URIs, the URI itself otherwise.
pub fn url_to_display_path(uri: &Url) -> String {
    if uri.scheme() == "file"
        && let Ok(path) = uri.to_file_path()
    {
        return path.display().to_string();
    }
    uri.to_string()
}

/// Converts user-facing 1-indexed position to LSP 0-indexed position.
///
/// # Errors
///
/// Returns error if line or column is 0.
pub fn to_lsp_position(line: u32, column: u32) -> LspResult<Position> {
    if line == 0 || column == 0 {
        return Err(LspError::InvalidPosition { line, column });
    }
    Ok(Position {
        line: line - 1,
        character: column - 1,
    })
}

/// Converts LSP 0-indexed position to user-facing 1-indexed position.
pub fn from_lsp_position(position: Position) -> (u32, u32) {
    (position.line + 1, position.character + 1)
}

/// Name of a protocol symbol kind.
pub fn symbol_kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::FILE => "File",
        SymbolKind::MODULE => "Module",
        SymbolKind::NAMESPACE => "Namespace",
        SymbolKind::PACKAGE => "Package",
        SymbolKind::CLASS => "Class",
        SymbolKind::METHOD => "Method",
        SymbolKind::PROPERTY => "Property",
        SymbolKind::FIELD => "Field",
        SymbolKind::CONSTRUCTOR => "Constructor",
        SymbolKind::ENUM => "Enum",
        SymbolKind::INTERFACE => "Interface",
        SymbolKind::FUNCTION => "Function",
        SymbolKind::VARIABLE => "Variable",
        SymbolKind::CONSTANT => "Constant",
        SymbolKind::STRING => "String",
        SymbolKind::NUMBER => "Number",
        SymbolKind::BOOLEAN => "Boolean",
        SymbolKind::ARRAY => "Array",
        SymbolKind::OBJECT => "Object",
        SymbolKind::KEY => "Key",
        SymbolKind::NULL => "Null",
        SymbolKind::ENUM_MEMBER => "EnumMember",
        SymbolKind::STRUCT => "Struct",
        SymbolKind::EVENT => "Event",
        SymbolKind::OPERATOR => "Operator",
        SymbolKind::TYPE_PARAMETER => "TypeParameter",
        _ => "Unknown",
    }
}

/// Fixed-width `[Kind]` label that lines symbol names up in a column.
pub fn symbol_kind_label(kind: SymbolKind) -> String {
    let bracketed = format!("[{}]", symbol_kind_name(kind));
    format!("{bracketed:<width$}", width = KIND_LABEL_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_lsp_position() {
        let pos = to_lsp_position(1, 1).unwrap();
        assert_eq!(pos.line, 0);
        assert_eq!(pos.character, 0);

        let pos = to_lsp_position(5, 3).unwrap();
        assert_eq!(pos.line, 4);
        assert_eq!(pos.character, 2);
    }

    #[test]
    fn test_to_lsp_position_invalid() {
        assert!(to_lsp_position(0, 1).is_err());
        assert!(to_lsp_position(1, 0).is_err());
    }

    #[test]
    fn test_position_round_trip() {
        let pos = to_lsp_position(5, 3).unwrap();
        assert_eq!(from_lsp_position(pos), (5, 3));
    }

    #[test]
    fn test_symbol_kind_label_is_padded() {
        assert_eq!(symbol_kind_label(SymbolKind::FUNCTION), "[Function]     ");
        assert_eq!(symbol_kind_label(SymbolKind::TYPE_PARAMETER), "[TypeParameter]");
        assert_eq!(symbol_kind_label(SymbolKind::ENUM_MEMBER).len(), 15);
    }

    #[test]
    fn test_unknown_symbol_kind() {
        let kind: SymbolKind = serde_json::from_value(serde_json::json!(99)).unwrap();
        assert_eq!(symbol_kind_name(kind), "Unknown");
    }

    #[test]
    fn test_buffer_name_to_url() {
        let uri = buffer_name_to_url("/tmp/project/src/main.rs").unwrap();
        assert_eq!(uri.as_str(), "file:///tmp/project/src/main.rs");

        let uri = buffer_name_to_url("deno:/https/deno.land/x/mod.ts").unwrap();
        assert_eq!(uri.as_str(), "deno:/https/deno.land/x/mod.ts");

        assert!(buffer_name_to_url("[No Name]").is_err());
    }

    #[test]
    fn test_url_to_display_path() {
        let uri = Url::parse("file:///tmp/a%20b.rs").unwrap();
        assert_eq!(url_to_display_path(&uri), "/tmp/a b.rs");

        let uri = Url::parse("deno:/asset/lib.d.ts").unwrap();
        assert_eq!(url_to_display_path(&uri), "deno:/asset/lib.d.ts");
    }

    #[test]
    fn test_path_to_url() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nav_source_test.rs");
        std::fs::write(&file, "// test file").expect("Failed to create temp file");

        let uri = path_to_url(&file).unwrap();
        assert!(uri.as_str().starts_with("file://"));
        assert!(uri.as_str().contains("nav_source_test.rs"));
    }

    #[test]
    fn test_path_to_url_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does_not_exist.rs");

        let err = path_to_url(&missing).unwrap_err();
        assert!(matches!(err, LspError::DocumentNotFound(_)));
    }
}
