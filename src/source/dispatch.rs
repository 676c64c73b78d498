//! Request dispatch.
//!
//! Builds the payload each method expects, checks that some server can
//! answer it, and hands it to the [`LanguageClient`]. The answer is the raw
//! per-responder array; shaping it is the normalizer's job.

use async_trait::async_trait;
use lsp_types::{CallHierarchyItem, Position, TextDocumentIdentifier};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::GatherError;
use crate::lsp::LspResult;

use super::identity::BufferId;
use super::method::{Method, Request};

/// Transport and capability negotiation towards the attached servers.
#[async_trait]
pub trait LanguageClient: Send + Sync {
    /// Whether the servers attached to `buffer` support `method`.
    ///
    /// `Some(false)` means servers are attached but none supports it,
    /// `None` means no server is attached at all.
    async fn supports_method(&self, buffer: BufferId, method: Request) -> Option<bool>;

    /// Sends `method` to every server attached to `buffer`.
    ///
    /// Returns one element per responding server, or `None` when there is
    /// no answer at all.
    /// ## Errors
    /// Transport failures.
    async fn request(
        &self,
        buffer: BufferId,
        method: Request,
        params: Value,
    ) -> LspResult<Option<Vec<Value>>>;
}

/// Sends requests on behalf of one buffer.
#[derive(Clone, Copy)]
pub struct Dispatcher<'a> {
    client: &'a dyn LanguageClient,
    buffer: BufferId,
}

impl<'a> Dispatcher<'a> {
    /// Creates a dispatcher for `buffer`.
    pub fn new(client: &'a dyn LanguageClient, buffer: BufferId) -> Self {
        Self { client, buffer }
    }

    /// Checks that some attached server supports `method`.
    /// ## Errors
    /// `Unsupported` or `NoServer`.
    pub async fn negotiate(&self, method: Method) -> Result<(), GatherError> {
        match self.client.supports_method(self.buffer, method.into()).await {
            Some(true) => Ok(()),
            Some(false) => Err(GatherError::Unsupported(method.as_str())),
            None => Err(GatherError::NoServer),
        }
    }

    /// Sends a request and returns the per-responder results.
    /// ## Errors
    /// `EmptyResult` when nobody answered, `Transport` when sending failed.
    pub async fn send(&self, request: Request, params: Value) -> Result<Vec<Value>, GatherError> {
        let response = self
            .client
            .request(self.buffer, request, params)
            .await
            .map_err(GatherError::Transport)?
            .ok_or(GatherError::EmptyResult)?;
        debug!(method = %request, responders = response.len(), "response received");
        Ok(response)
    }
}

/// `{textDocument, position}`
pub fn position_params(document: &TextDocumentIdentifier, position: Position) -> Value {
    json!({
        "textDocument": document,
        "position": position,
    })
}

/// `{textDocument, position, context: {includeDeclaration: true}}`
pub fn reference_params(document: &TextDocumentIdentifier, position: Position) -> Value {
    json!({
        "textDocument": document,
        "position": position,
        "context": { "includeDeclaration": true },
    })
}

/// `{textDocument}`
pub fn document_params(document: &TextDocumentIdentifier) -> Value {
    json!({ "textDocument": document })
}

/// `{query}`
pub fn workspace_symbol_params(query: &str) -> Value {
    json!({ "query": query })
}

/// `{item}`
pub fn call_params(item: &CallHierarchyItem) -> Value {
    json!({ "item": item })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Url;

    fn document() -> TextDocumentIdentifier {
        TextDocumentIdentifier {
            uri: Url::parse("file:///tmp/project/src/lib.rs").unwrap(),
        }
    }

    #[test]
    fn test_reference_params_include_declaration() {
        let params = reference_params(&document(), Position::new(4, 2));
        assert_eq!(params["textDocument"]["uri"], "file:///tmp/project/src/lib.rs");
        assert_eq!(params["position"]["line"], 4);
        assert_eq!(params["position"]["character"], 2);
        assert_eq!(params["context"]["includeDeclaration"], true);
    }

    #[test]
    fn test_document_params_carry_no_position() {
        let params = document_params(&document());
        assert!(params.get("position").is_none());
    }
}
