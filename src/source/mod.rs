//! The navigation source.
//!
//! [`Source`] turns one selector request into at most one batch of
//! [`Item`]s:
//!
//! ```text
//! identity ─► dispatch ─► normalize ─► filter ─► item ─► batch
//!                 ▲                                 │
//!                 └──────── call_tree (expand) ◄────┘
//! ```
//!
//! Terminal conditions (unknown method, no capable server, empty answer)
//! close the stream without a batch and are reported through `tracing`.
//!
//! # Example
//!
//! ```ignore
//! let source = Source::new(client, host);
//! let args = GatherArgs::new(BufferId(1), WindowId(1000), "textDocument/references");
//! let batches: Vec<Vec<Item>> = source.gather(args).collect().await;
//! ```

pub mod call_tree;
pub mod dispatch;
pub mod filter;
pub mod identity;
pub mod item;
pub mod method;
pub mod normalize;

use std::sync::Arc;

use futures::{Stream, StreamExt, future, stream};
use lsp_types::{Location, Position, Range, TextDocumentIdentifier};
use tokio::sync::Mutex;

use crate::config::{SourceOptions, SourceParams};
use crate::error::GatherError;

pub use call_tree::{CallNode, CallTree, Expansion, NodeId};
pub use dispatch::{Dispatcher, LanguageClient};
pub use identity::{BufferId, FileHost, Host, WindowId};
pub use item::{Item, ItemData, NavigationTarget, ResolveRequest};
pub use method::{Method, Request};

use dispatch::{
    document_params, position_params, reference_params, workspace_symbol_params,
};
use normalize::SymbolEntry;

/// Everything one gather needs to know.
#[derive(Debug, Clone)]
pub struct GatherArgs {
    /// Buffer the request is made from.
    pub buffer: BufferId,
    /// Window whose cursor positions the request.
    pub window: WindowId,
    /// Source parameters.
    pub params: SourceParams,
    /// Source options.
    pub options: SourceOptions,
    /// Live selector input.
    pub input: String,
    /// Node to expand; `None` starts a fresh search.
    pub parent: Option<NodeId>,
}

impl GatherArgs {
    /// Fresh search for `method` with default options.
    pub fn new(buffer: BufferId, window: WindowId, method: impl Into<String>) -> Self {
        Self {
            buffer,
            window,
            params: SourceParams {
                method: method.into(),
                query: String::new(),
            },
            options: SourceOptions::default(),
            input: String::new(),
            parent: None,
        }
    }

    /// Sets the workspace symbol query.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.params.query = query.into();
        self
    }

    /// Expands `node` instead of starting a fresh search.
    #[must_use]
    pub fn expand(mut self, node: NodeId) -> Self {
        self.parent = Some(node);
        self
    }
}

/// Navigation source over a language client and a host.
pub struct Source {
    client: Arc<dyn LanguageClient>,
    host: Arc<dyn Host>,
    call_tree: Mutex<CallTree>,
}

impl Source {
    /// Creates a source.
    pub fn new(client: Arc<dyn LanguageClient>, host: Arc<dyn Host>) -> Self {
        Self {
            client,
            host,
            call_tree: Mutex::new(CallTree::new(0, Method::IncomingCalls)),
        }
    }

    /// Runs one gather.
    ///
    /// The stream yields at most one batch and then closes. Terminal
    /// conditions are logged and yield no batch.
    pub fn gather(&self, args: GatherArgs) -> impl Stream<Item = Vec<Item>> + Send + '_ {
        stream::once(async move {
            let method = args.params.method.clone();
            match self.collect(args).await {
                Ok(items) => Some(items),
                Err(e) => {
                    e.log(&method);
                    None
                }
            }
        })
        .filter_map(future::ready)
    }

    /// Runs one gather and returns the batch or the terminal condition,
    /// without logging it.
    /// ## Errors
    /// See [`GatherError`].
    pub async fn collect(&self, args: GatherArgs) -> Result<Vec<Item>, GatherError> {
        let method: Method = args.params.method.parse()?;
        let dispatcher = Dispatcher::new(self.client.as_ref(), args.buffer);
        dispatcher.negotiate(method).await?;

        match method {
            Method::Declaration
            | Method::Definition
            | Method::TypeDefinition
            | Method::Implementation => {
                let (document, position) = self.cursor_identity(&args).await?;
                let response = dispatcher
                    .send(method.into(), position_params(&document, position))
                    .await?;
                Ok(location_items(normalize::definitions(response)))
            }
            Method::References => {
                let (document, position) = self.cursor_identity(&args).await?;
                let response = dispatcher
                    .send(method.into(), reference_params(&document, position))
                    .await?;
                Ok(location_items(normalize::references(response)))
            }
            Method::DocumentSymbol => {
                let document = self.document(args.buffer).await?;
                let response = dispatcher
                    .send(method.into(), document_params(&document))
                    .await?;
                Ok(symbol_items(normalize::document_symbols(
                    response,
                    args.buffer,
                )))
            }
            Method::WorkspaceSymbol => {
                let query = if args.options.volatile {
                    &args.input
                } else {
                    &args.params.query
                };
                let response = dispatcher
                    .send(method.into(), workspace_symbol_params(query))
                    .await?;
                Ok(symbol_items(normalize::workspace_symbols(response)))
            }
            Method::IncomingCalls | Method::OutgoingCalls => {
                self.call_hierarchy(method, dispatcher, &args).await
            }
        }
    }

    async fn call_hierarchy(
        &self,
        method: Method,
        dispatcher: Dispatcher<'_>,
        args: &GatherArgs,
    ) -> Result<Vec<Item>, GatherError> {
        if let Some(parent) = args.parent {
            let children = call_tree::children(&self.call_tree, parent)
                .await
                .unwrap_or_default();
            return Ok(call_tree::expand(&self.call_tree, dispatcher, &children).await);
        }

        let (document, position) = self.cursor_identity(args).await?;
        let response = dispatcher
            .send(
                Request::PrepareCallHierarchy,
                position_params(&document, position),
            )
            .await?;
        let prepared = normalize::prepared_items(response);
        if prepared.is_empty() {
            return Err(GatherError::EmptyResult);
        }

        let roots: Vec<NodeId> = {
            let mut tree = self.call_tree.lock().await;
            *tree = CallTree::new(tree.generation() + 1, method);
            prepared.into_iter().map(|item| tree.add_root(item)).collect()
        };
        Ok(call_tree::expand(&self.call_tree, dispatcher, &roots).await)
    }

    /// Resolves the range of a deferred workspace symbol.
    ///
    /// `None` means navigation is unavailable for the entry.
    pub async fn resolve(&self, buffer: BufferId, request: &ResolveRequest) -> Option<Range> {
        let dispatcher = Dispatcher::new(self.client.as_ref(), buffer);
        match dispatcher
            .send(Request::WorkspaceSymbolResolve, request.symbol.clone())
            .await
        {
            Ok(response) => normalize::resolved_range(response),
            Err(e) => {
                e.log(Request::WorkspaceSymbolResolve.as_str());
                None
            }
        }
    }

    /// Range of any navigation target, resolving deferred ones.
    pub async fn target_range(&self, buffer: BufferId, target: &NavigationTarget) -> Option<Range> {
        match target {
            NavigationTarget::Deferred { request, .. } => self.resolve(buffer, request).await,
            other => other.range(),
        }
    }

    /// Snapshot of a call hierarchy node.
    pub async fn call_node(&self, id: NodeId) -> Option<CallNode> {
        self.call_tree.lock().await.node(id).cloned()
    }

    async fn document(&self, buffer: BufferId) -> Result<TextDocumentIdentifier, GatherError> {
        identity::resolve_document(self.host.as_ref(), buffer)
            .await
            .map_err(GatherError::Identity)
    }

    async fn cursor_identity(
        &self,
        args: &GatherArgs,
    ) -> Result<(TextDocumentIdentifier, Position), GatherError> {
        let position = identity::resolve_position(self.host.as_ref(), args.window)
            .await
            .map_err(GatherError::Identity)?;
        Ok((self.document(args.buffer).await?, position))
    }
}

fn location_items(locations: Vec<Location>) -> Vec<Item> {
    locations
        .into_iter()
        .filter(|location| !filter::is_excluded(location))
        .map(Item::from_location)
        .collect()
}

fn symbol_items(entries: Vec<SymbolEntry>) -> Vec<Item> {
    entries
        .into_iter()
        .map(|entry| Item::from_symbol(entry.name, entry.kind, entry.target))
        .collect()
}
