//! Navigation method tags.

use std::fmt;
use std::str::FromStr;

use crate::error::GatherError;

/// A navigation method the selector can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `textDocument/declaration`
    Declaration,
    /// `textDocument/definition`
    Definition,
    /// `textDocument/typeDefinition`
    TypeDefinition,
    /// `textDocument/implementation`
    Implementation,
    /// `textDocument/references`
    References,
    /// `textDocument/documentSymbol`
    DocumentSymbol,
    /// `workspace/symbol`
    WorkspaceSymbol,
    /// `callHierarchy/incomingCalls`
    IncomingCalls,
    /// `callHierarchy/outgoingCalls`
    OutgoingCalls,
}

impl Method {
    /// Every selectable method.
    pub const ALL: [Method; 9] = [
        Method::Declaration,
        Method::Definition,
        Method::TypeDefinition,
        Method::Implementation,
        Method::References,
        Method::DocumentSymbol,
        Method::WorkspaceSymbol,
        Method::IncomingCalls,
        Method::OutgoingCalls,
    ];

    /// Protocol method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Declaration => "textDocument/declaration",
            Method::Definition => "textDocument/definition",
            Method::TypeDefinition => "textDocument/typeDefinition",
            Method::Implementation => "textDocument/implementation",
            Method::References => "textDocument/references",
            Method::DocumentSymbol => "textDocument/documentSymbol",
            Method::WorkspaceSymbol => "workspace/symbol",
            Method::IncomingCalls => "callHierarchy/incomingCalls",
            Method::OutgoingCalls => "callHierarchy/outgoingCalls",
        }
    }

    /// Whether this method builds a call-hierarchy tree.
    pub fn is_call_hierarchy(self) -> bool {
        matches!(self, Method::IncomingCalls | Method::OutgoingCalls)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = GatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| GatherError::UnknownMethod(s.to_string()))
    }
}

/// Any request the dispatcher sends: the selectable methods plus the
/// follow-up requests the pipeline issues on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    /// A selectable navigation method.
    Navigate(Method),
    /// `textDocument/prepareCallHierarchy`
    PrepareCallHierarchy,
    /// `workspaceSymbol/resolve`
    WorkspaceSymbolResolve,
}

impl Request {
    /// Protocol method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Request::Navigate(method) => method.as_str(),
            Request::PrepareCallHierarchy => "textDocument/prepareCallHierarchy",
            Request::WorkspaceSymbolResolve => "workspaceSymbol/resolve",
        }
    }
}

impl From<Method> for Request {
    fn from(method: Method) -> Self {
        Request::Navigate(method)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_method() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_method_rejected() {
        let err = "textDocument/bogus".parse::<Method>().unwrap_err();
        assert!(matches!(err, GatherError::UnknownMethod(tag) if tag == "textDocument/bogus"));
    }

    #[test]
    fn test_internal_requests_not_selectable() {
        assert!(
            Request::PrepareCallHierarchy
                .as_str()
                .parse::<Method>()
                .is_err()
        );
        assert!(
            Request::WorkspaceSymbolResolve
                .as_str()
                .parse::<Method>()
                .is_err()
        );
    }
}
