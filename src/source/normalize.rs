//! Response normalization.
//!
//! Every navigation method answers with an array holding one result per
//! responding server, and most results come in more than one protocol
//! shape. Each shape is decoded exactly once here, by an explicit field
//! test, into a closed enum and then into the canonical types the rest of
//! the pipeline works with.
//!
//! A server that answered `null` contributes nothing. A server whose answer
//! cannot be decoded is skipped with a warning; the others still count.

use lsp_types::{
    CallHierarchyIncomingCall, CallHierarchyItem, CallHierarchyOutgoingCall, DocumentSymbol,
    Location, LocationLink, OneOf, Range, SymbolInformation, SymbolKind, WorkspaceSymbol,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::lsp::types::url_to_display_path;

use super::identity::BufferId;
use super::item::{NavigationTarget, ResolveRequest};

type DecodeResult<T> = Result<T, serde_json::Error>;

/// A symbol reduced to what an item needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    /// Symbol name.
    pub name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Where the symbol lives.
    pub target: NavigationTarget,
}

/// One call site of a call hierarchy answer.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    /// The caller (incoming) or callee (outgoing).
    pub item: CallHierarchyItem,
    /// Range of the call expression.
    pub range: Range,
}

enum LocationShape {
    Location(Location),
    Link(LocationLink),
}

impl LocationShape {
    fn decode(value: Value) -> DecodeResult<Self> {
        if value.get("uri").is_some() && value.get("range").is_some() {
            serde_json::from_value(value).map(LocationShape::Location)
        } else {
            serde_json::from_value(value).map(LocationShape::Link)
        }
    }

    fn into_location(self) -> Location {
        match self {
            LocationShape::Location(location) => location,
            LocationShape::Link(link) => Location {
                uri: link.target_uri,
                range: link.target_selection_range,
            },
        }
    }
}

enum DocumentSymbolShape {
    Information(SymbolInformation),
    Document(DocumentSymbol),
}

impl DocumentSymbolShape {
    fn decode(value: Value) -> DecodeResult<Self> {
        if value.get("location").is_some() {
            serde_json::from_value(value).map(DocumentSymbolShape::Information)
        } else {
            serde_json::from_value(value).map(DocumentSymbolShape::Document)
        }
    }

    fn into_entry(self, buffer: BufferId) -> SymbolEntry {
        match self {
            DocumentSymbolShape::Information(info) => SymbolEntry {
                target: NavigationTarget::location(&info.location),
                name: info.name,
                kind: info.kind,
            },
            DocumentSymbolShape::Document(symbol) => SymbolEntry {
                target: NavigationTarget::Buffer {
                    buffer,
                    range: symbol.selection_range,
                },
                name: symbol.name,
                kind: symbol.kind,
            },
        }
    }
}

enum WorkspaceSymbolShape {
    Information(SymbolInformation),
    Unresolved {
        symbol: WorkspaceSymbol,
        payload: Value,
    },
}

impl WorkspaceSymbolShape {
    fn decode(value: Value) -> DecodeResult<Self> {
        let has_range = value
            .get("location")
            .is_some_and(|location| location.get("range").is_some());
        if has_range {
            serde_json::from_value(value).map(WorkspaceSymbolShape::Information)
        } else {
            let symbol = serde_json::from_value(value.clone())?;
            Ok(WorkspaceSymbolShape::Unresolved {
                symbol,
                payload: value,
            })
        }
    }

    fn into_entry(self) -> SymbolEntry {
        match self {
            WorkspaceSymbolShape::Information(info) => SymbolEntry {
                target: NavigationTarget::location(&info.location),
                name: info.name,
                kind: info.kind,
            },
            WorkspaceSymbolShape::Unresolved { symbol, payload } => {
                let uri = match &symbol.location {
                    OneOf::Left(location) => &location.uri,
                    OneOf::Right(location) => &location.uri,
                };
                SymbolEntry {
                    target: NavigationTarget::Deferred {
                        path: url_to_display_path(uri),
                        request: ResolveRequest { symbol: payload },
                    },
                    name: symbol.name,
                    kind: symbol.kind,
                }
            }
        }
    }
}

enum CallShape {
    Incoming(CallHierarchyIncomingCall),
    Outgoing(CallHierarchyOutgoingCall),
}

impl CallShape {
    fn decode(value: Value) -> DecodeResult<Self> {
        if value.get("from").is_some() {
            serde_json::from_value(value).map(CallShape::Incoming)
        } else {
            serde_json::from_value(value).map(CallShape::Outgoing)
        }
    }

    fn into_sites(self) -> Vec<CallSite> {
        let (item, ranges) = match self {
            CallShape::Incoming(call) => (call.from, call.from_ranges),
            CallShape::Outgoing(call) => (call.to, call.from_ranges),
        };
        ranges
            .into_iter()
            .map(|range| CallSite {
                item: item.clone(),
                range,
            })
            .collect()
    }
}

/// Decodes each responder's result with `decode`, skipping nulls and
/// undecodable results, and concatenates in responder order.
fn per_responder<T>(
    response: Vec<Value>,
    what: &'static str,
    decode: impl Fn(Value) -> DecodeResult<Vec<T>>,
) -> Vec<T> {
    let mut out = Vec::new();
    for (responder, result) in response.into_iter().enumerate() {
        if result.is_null() {
            continue;
        }
        match decode(result) {
            Ok(entries) => out.extend(entries),
            Err(e) => warn!(responder, error = %e, "skipping undecodable {what} result"),
        }
    }
    out
}

/// Decodes an array result element by element.
fn each<S>(result: Value, decode: impl Fn(Value) -> DecodeResult<S>) -> DecodeResult<Vec<S>> {
    serde_json::from_value::<Vec<Value>>(result)?
        .into_iter()
        .map(decode)
        .collect()
}

fn decode_all<T: DeserializeOwned>(result: Value) -> DecodeResult<Vec<T>> {
    serde_json::from_value(result)
}

/// Declaration, definition, type definition and implementation.
///
/// Each result is a single location, a list of locations or a list of
/// location links.
pub fn definitions(response: Vec<Value>) -> Vec<Location> {
    per_responder(response, "definition", |result| {
        let shapes = if result.is_array() {
            each(result, LocationShape::decode)?
        } else {
            vec![LocationShape::decode(result)?]
        };
        Ok(shapes.into_iter().map(LocationShape::into_location).collect())
    })
}

/// References: each result is a list of locations.
pub fn references(response: Vec<Value>) -> Vec<Location> {
    per_responder(response, "references", decode_all::<Location>)
}

/// Document symbols, sorted by start line.
///
/// Symbol information keeps its own location; document symbols point at
/// their selection range in `buffer`.
pub fn document_symbols(response: Vec<Value>, buffer: BufferId) -> Vec<SymbolEntry> {
    let mut entries = per_responder(response, "documentSymbol", |result| {
        Ok(each(result, DocumentSymbolShape::decode)?
            .into_iter()
            .map(|shape| shape.into_entry(buffer))
            .collect())
    });
    entries.sort_by_key(|entry| entry.target.range().map(|range| range.start.line));
    entries
}

/// Workspace symbols; entries lacking a range get a deferred target.
pub fn workspace_symbols(response: Vec<Value>) -> Vec<SymbolEntry> {
    per_responder(response, "workspace/symbol", |result| {
        Ok(each(result, WorkspaceSymbolShape::decode)?
            .into_iter()
            .map(WorkspaceSymbolShape::into_entry)
            .collect())
    })
}

/// Range of a `workspaceSymbol/resolve` answer.
pub fn resolved_range(response: Vec<Value>) -> Option<Range> {
    let first = response.into_iter().next()?;
    match serde_json::from_value::<WorkspaceSymbol>(first) {
        Ok(WorkspaceSymbol {
            location: OneOf::Left(location),
            ..
        }) => Some(location.range),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "undecodable workspaceSymbol/resolve result");
            None
        }
    }
}

/// Call hierarchy roots from `textDocument/prepareCallHierarchy`.
pub fn prepared_items(response: Vec<Value>) -> Vec<CallHierarchyItem> {
    per_responder(response, "prepareCallHierarchy", decode_all::<CallHierarchyItem>)
}

/// Incoming or outgoing calls, one entry per call site.
pub fn calls(response: Vec<Value>) -> Vec<CallSite> {
    per_responder(response, "callHierarchy", |result| {
        Ok(each(result, CallShape::decode)?
            .into_iter()
            .flat_map(CallShape::into_sites)
            .collect())
    })
}
