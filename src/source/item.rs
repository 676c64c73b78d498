//! Selectable items and how they are labelled.

use lsp_types::{CallHierarchyItem, Location, Range, SymbolKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lsp::types::{from_lsp_position, symbol_kind_label, url_to_display_path};

use super::call_tree::NodeId;
use super::identity::BufferId;

/// Payload of a `workspaceSymbol/resolve` round trip.
///
/// Kept inert so items stay plain data; hand it to
/// [`crate::source::Source::resolve`] to obtain the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// The workspace symbol exactly as the server sent it.
    pub symbol: Value,
}

/// Where selecting an item navigates to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigationTarget {
    /// A range in a file (or virtual document).
    Location {
        /// Filesystem path, or the URI for non-`file:` documents.
        path: String,
        /// Target range.
        range: Range,
    },
    /// A range in the buffer the request was made from.
    Buffer {
        /// Requesting buffer.
        buffer: BufferId,
        /// Target range.
        range: Range,
    },
    /// A workspace symbol whose range needs a resolve round trip.
    Deferred {
        /// Filesystem path, or the URI for non-`file:` documents.
        path: String,
        /// Resolve payload.
        request: ResolveRequest,
    },
}

impl NavigationTarget {
    /// Target range, if already known.
    pub fn range(&self) -> Option<Range> {
        match self {
            NavigationTarget::Location { range, .. } | NavigationTarget::Buffer { range, .. } => {
                Some(*range)
            }
            NavigationTarget::Deferred { .. } => None,
        }
    }

    pub(crate) fn location(location: &Location) -> Self {
        NavigationTarget::Location {
            path: url_to_display_path(&location.uri),
            range: location.range,
        }
    }
}

/// The canonical entity an item was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ItemData {
    /// Definition family and references.
    Location(Location),
    /// Document and workspace symbols.
    Symbol {
        /// Symbol name.
        name: String,
        /// Symbol kind.
        kind: SymbolKind,
    },
    /// Call hierarchy nodes.
    Call(CallHierarchyItem),
}

/// One selectable, navigable entry of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Text the selector matches against.
    pub word: String,
    /// Text shown instead of `word`, when different.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Navigation target.
    pub action: NavigationTarget,
    /// Tree path of call hierarchy entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_path: Option<String>,
    /// Whether a call hierarchy entry has children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_tree: Option<bool>,
    /// Handle of a call hierarchy entry, used to expand it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Source entity.
    pub data: ItemData,
}

impl Item {
    /// Location entry: `path:line:col`.
    pub fn from_location(location: Location) -> Self {
        let path = url_to_display_path(&location.uri);
        let (line, column) = from_lsp_position(location.range.start);
        Self {
            display: Some(format!("{path}:{line}:{column}")),
            word: path,
            action: NavigationTarget::location(&location),
            tree_path: None,
            is_tree: None,
            node: None,
            data: ItemData::Location(location),
        }
    }

    /// Symbol entry: `[Kind]         name`.
    pub fn from_symbol(name: String, kind: SymbolKind, action: NavigationTarget) -> Self {
        Self {
            word: format!("{} {}", symbol_kind_label(kind), name),
            display: None,
            action,
            tree_path: None,
            is_tree: None,
            node: None,
            data: ItemData::Symbol { name, kind },
        }
    }

    /// Start line of the navigation range, if known.
    pub fn start_line(&self) -> Option<u32> {
        self.action.range().map(|range| range.start.line)
    }
}

/// `name:line:col` of a call site.
pub fn call_site_display(name: &str, range: &Range) -> String {
    let (line, column) = from_lsp_position(range.start);
    format!("{name}:{line}:{column}")
}
