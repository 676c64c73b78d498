//! LSP client implementation.
//!
//! Spawns one language server, performs the initialize handshake and
//! exposes it to the gather pipeline as a [`LanguageClient`]: capability
//! negotiation answers from the server's initialize result, and every
//! request is answered by exactly one responder.
//!
//! # Example
//!
//! ```ignore
//! use lsp_nav_source::lsp::client::LspClient;
//!
//! let client = LspClient::builder()
//!     .server_command("rust-analyzer")
//!     .workspace_root("/path/to/project")
//!     .build()
//!     .await?;
//!
//! client.did_open(Path::new("/path/to/project/src/main.rs")).await?;
//! client.shutdown().await?;
//! ```

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_lsp::concurrency::ConcurrencyLayer;
use async_lsp::panic::CatchUnwindLayer;
use async_lsp::router::Router;
use async_lsp::tracing::TracingLayer;
use async_lsp::{LanguageServer, ServerSocket};
use async_trait::async_trait;
use lsp_types::request::{
    CallHierarchyIncomingCalls, CallHierarchyOutgoingCalls, CallHierarchyPrepare,
    DocumentSymbolRequest, GotoDeclaration, GotoDefinition, GotoImplementation,
    GotoTypeDefinition, References, WorkspaceSymbolRequest, WorkspaceSymbolResolve,
};
use lsp_types::{
    ClientCapabilities, ClientInfo, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbolClientCapabilities, DynamicRegistrationClientCapabilities, GotoCapability,
    InitializeParams, InitializedParams, TextDocumentClientCapabilities, TextDocumentIdentifier,
    TextDocumentItem, TextDocumentSyncClientCapabilities, TraceValue, Url,
    WindowClientCapabilities, WorkDoneProgressParams, WorkspaceClientCapabilities,
    WorkspaceFolder, WorkspaceSymbolClientCapabilities, notification,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tracing::debug;

use crate::error::LspError;
use crate::source::{BufferId, LanguageClient, Method, Request};

use super::LspResult;
use super::types::path_to_url;

/// State for handling LSP client notifications.
#[derive(Debug, Clone)]
struct ClientState {}

impl ClientState {
    fn new() -> Self {
        Self {}
    }
}

/// Configuration for building an LSP client.
#[derive(Debug, Clone)]
pub struct LspClientConfig {
    /// Command to start the language server.
    pub server_command: String,
    /// Arguments to pass to the language server.
    pub server_args: Vec<String>,
    /// Root directory of the workspace.
    pub workspace_root: PathBuf,
    /// Timeout for initialization.
    pub init_timeout: std::time::Duration,
    /// Timeout for requests.
    pub request_timeout: std::time::Duration,
}

impl Default for LspClientConfig {
    fn default() -> Self {
        Self {
            server_command: "rust-analyzer".to_string(),
            server_args: Vec::new(),
            workspace_root: PathBuf::from("."),
            init_timeout: std::time::Duration::from_secs(30),
            request_timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// Builder for constructing an LSP client.
#[derive(Debug, Default)]
pub struct LspClientBuilder {
    config: LspClientConfig,
}

impl LspClientBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server command.
    #[must_use]
    pub fn server_command(mut self, command: impl Into<String>) -> Self {
        self.config.server_command = command.into();
        self
    }

    /// Sets the server arguments.
    #[must_use]
    pub fn server_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.server_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the workspace root.
    #[must_use]
    pub fn workspace_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.workspace_root = path.into();
        self
    }

    /// Sets the initialization timeout.
    #[must_use]
    pub fn init_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.init_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Builds the LSP client.
    ///
    /// This will spawn the language server process and perform initialization.
    /// ## Errors
    pub async fn build(self) -> LspResult<LspClient> {
        let workspace_root = self.config.workspace_root.canonicalize().map_err(|e| {
            LspError::InitializationFailed(format!("failed to canonicalize workspace root: {e}"))
        })?;

        let mut cmd = async_process::Command::new(&self.config.server_command);
        cmd.args(&self.config.server_args)
            .current_dir(&workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            LspError::ServerStartFailed(format!(
                "failed to spawn '{}': {}",
                self.config.server_command, e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::ServerStartFailed("failed to capture stdout".to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::ServerStartFailed("failed to capture stdin".to_string()))?;

        let (mainloop, server) = async_lsp::MainLoop::new_client(|_client| {
            let mut router = Router::new(ClientState::new());

            router.notification::<notification::Progress>(|_this, _prog| ControlFlow::Continue(()));
            router.notification::<notification::PublishDiagnostics>(|_this, _diag| {
                ControlFlow::Continue(())
            });
            router.notification::<notification::ShowMessage>(|_this, params| {
                debug!(message = %params.message, "server message");
                ControlFlow::Continue(())
            });

            ServiceBuilder::new()
                .layer(TracingLayer::default())
                .layer(CatchUnwindLayer::default())
                .layer(ConcurrencyLayer::default())
                .service(router)
        });

        let mainloop_handle = tokio::spawn(async move {
            mainloop.run_buffered(stdout, stdin).await.ok();
        });

        let workspace_uri = Url::from_file_path(&workspace_root).map_err(|()| {
            LspError::InitializationFailed(format!(
                "invalid workspace root path: {}",
                workspace_root.display()
            ))
        })?;

        let goto = GotoCapability {
            dynamic_registration: Some(false),
            link_support: Some(true),
        };

        let init_params = InitializeParams {
            process_id: Some(std::process::id()),
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: workspace_uri,
                name: workspace_root
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("workspace")
                    .to_string(),
            }]),
            capabilities: ClientCapabilities {
                workspace: Some(WorkspaceClientCapabilities {
                    symbol: Some(WorkspaceSymbolClientCapabilities {
                        dynamic_registration: Some(false),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                text_document: Some(TextDocumentClientCapabilities {
                    synchronization: Some(TextDocumentSyncClientCapabilities {
                        dynamic_registration: Some(false),
                        will_save: Some(false),
                        will_save_wait_until: Some(false),
                        did_save: Some(false),
                    }),
                    declaration: Some(goto.clone()),
                    definition: Some(goto.clone()),
                    type_definition: Some(goto.clone()),
                    implementation: Some(goto),
                    references: Some(DynamicRegistrationClientCapabilities {
                        dynamic_registration: Some(false),
                    }),
                    document_symbol: Some(DocumentSymbolClientCapabilities {
                        dynamic_registration: Some(false),
                        hierarchical_document_symbol_support: Some(true),
                        ..Default::default()
                    }),
                    call_hierarchy: Some(DynamicRegistrationClientCapabilities {
                        dynamic_registration: Some(false),
                    }),
                    ..Default::default()
                }),
                window: Some(WindowClientCapabilities {
                    work_done_progress: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
            trace: Some(TraceValue::Off),
            client_info: Some(ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            work_done_progress_params: WorkDoneProgressParams::default(),
            ..Default::default()
        };

        let server = Arc::new(Mutex::new(server));

        let init_result = tokio::time::timeout(
            self.config.init_timeout,
            server.lock().await.initialize(init_params),
        )
        .await
        .map_err(|_| LspError::Timeout(self.config.init_timeout))?
        .map_err(|e| LspError::InitializationFailed(format!("initialize request failed: {e:?}")))?;

        let capabilities = serde_json::to_value(&init_result.capabilities)
            .map_err(|e| LspError::ParseError(format!("server capabilities: {e}")))?;

        server
            .lock()
            .await
            .initialized(InitializedParams {})
            .map_err(|e| {
                LspError::InitializationFailed(format!("initialized notification failed: {e:?}"))
            })?;

        Ok(LspClient {
            config: self.config,
            server,
            _mainloop_handle: mainloop_handle,
            capabilities: Arc::new(capabilities),
            open_documents: Arc::new(Mutex::new(HashSet::new())),
            _child_process: Arc::new(Mutex::new(child)),
        })
    }
}

/// LSP client for one spawned language server.
#[derive(Debug)]
pub struct LspClient {
    /// Configuration used to create this client.
    config: LspClientConfig,
    /// The language server handle for making requests.
    server: Arc<Mutex<ServerSocket>>,
    /// Handle to the mainloop task.
    _mainloop_handle: tokio::task::JoinHandle<()>,
    /// Server capabilities from initialization, as sent on the wire.
    capabilities: Arc<Value>,
    /// Set of currently open documents.
    open_documents: Arc<Mutex<HashSet<Url>>>,
    /// The language server process handle (kept alive to prevent kill-on-drop).
    _child_process: Arc<Mutex<async_process::Child>>,
}

impl LspClient {
    /// Creates a new builder for constructing an LSP client.
    pub fn builder() -> LspClientBuilder {
        LspClientBuilder::new()
    }

    /// Shuts down the language server gracefully.
    /// ## Errors
    pub async fn shutdown(&self) -> LspResult<()> {
        self.server
            .lock()
            .await
            .shutdown(())
            .await
            .map_err(|e| LspError::RequestFailed(format!("shutdown request failed: {e:?}")))?;

        self.server
            .lock()
            .await
            .exit(())
            .map_err(|e| LspError::RequestFailed(format!("exit notification failed: {e:?}")))?;

        Ok(())
    }

    /// Opens a document in the language server.
    ///
    /// Sends `textDocument/didOpen` unless the document is already open.
    /// ## Errors
    pub async fn did_open(&self, path: &Path) -> LspResult<()> {
        let uri = path_to_url(path)?;
        if self.open_documents.lock().await.contains(&uri) {
            return Ok(());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            LspError::DocumentNotFound(format!("failed to read '{}': {}", path.display(), e))
        })?;

        let language_id = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or("plaintext", language_id)
            .to_string();

        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id,
                version: 0,
                text: content,
            },
        };

        self.server
            .lock()
            .await
            .did_open(params)
            .map_err(|e| LspError::RequestFailed(format!("didOpen notification failed: {e:?}")))?;

        self.open_documents.lock().await.insert(uri);

        Ok(())
    }

    /// Closes a document in the language server.
    /// ## Errors
    pub async fn did_close(&self, path: &Path) -> LspResult<()> {
        let uri = path_to_url(path)?;

        let params = DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        };

        self.server
            .lock()
            .await
            .did_close(params)
            .map_err(|e| LspError::RequestFailed(format!("didClose notification failed: {e:?}")))?;

        self.open_documents.lock().await.remove(&uri);

        Ok(())
    }

    /// Whether the server advertised support for `method`.
    pub fn supports(&self, method: Request) -> bool {
        supports(&self.capabilities, method)
    }

    /// Sends a typed request built from raw params and returns the raw answer.
    async fn send<R: lsp_types::request::Request>(&self, params: Value) -> LspResult<Value> {
        let params: R::Params = serde_json::from_value(params)
            .map_err(|e| LspError::ParseError(format!("{} params: {e}", R::METHOD)))?;

        // clone the socket out so concurrent requests do not queue on the lock
        let server = self.server.lock().await.clone();
        let request = server.request::<R>(params);
        let result = tokio::time::timeout(self.config.request_timeout, request)
            .await
            .map_err(|_| LspError::Timeout(self.config.request_timeout))?
            .map_err(|e| LspError::RequestFailed(format!("{} failed: {e:?}", R::METHOD)))?;

        serde_json::to_value(result)
            .map_err(|e| LspError::ParseError(format!("{} result: {e}", R::METHOD)))
    }
}

#[async_trait]
impl LanguageClient for LspClient {
    async fn supports_method(&self, _buffer: BufferId, method: Request) -> Option<bool> {
        Some(self.supports(method))
    }

    async fn request(
        &self,
        _buffer: BufferId,
        method: Request,
        params: Value,
    ) -> LspResult<Option<Vec<Value>>> {
        let result = match method {
            Request::Navigate(Method::Declaration) => self.send::<GotoDeclaration>(params).await?,
            Request::Navigate(Method::Definition) => self.send::<GotoDefinition>(params).await?,
            Request::Navigate(Method::TypeDefinition) => {
                self.send::<GotoTypeDefinition>(params).await?
            }
            Request::Navigate(Method::Implementation) => {
                self.send::<GotoImplementation>(params).await?
            }
            Request::Navigate(Method::References) => self.send::<References>(params).await?,
            Request::Navigate(Method::DocumentSymbol) => {
                self.send::<DocumentSymbolRequest>(params).await?
            }
            Request::Navigate(Method::WorkspaceSymbol) => {
                self.send::<WorkspaceSymbolRequest>(params).await?
            }
            Request::Navigate(Method::IncomingCalls) => {
                self.send::<CallHierarchyIncomingCalls>(params).await?
            }
            Request::Navigate(Method::OutgoingCalls) => {
                self.send::<CallHierarchyOutgoingCalls>(params).await?
            }
            Request::PrepareCallHierarchy => self.send::<CallHierarchyPrepare>(params).await?,
            Request::WorkspaceSymbolResolve => self.send::<WorkspaceSymbolResolve>(params).await?,
        };

        if result.is_null() {
            Ok(None)
        } else {
            Ok(Some(vec![result]))
        }
    }
}

/// Language identifier for a file extension.
fn language_id(ext: &str) -> &'static str {
    match ext {
        "rs" => "rust",
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "go" => "go",
        "c" => "c",
        "cpp" | "cc" | "cxx" => "cpp",
        "java" => "java",
        _ => "plaintext",
    }
}

/// Whether a provider entry of the capabilities object is enabled.
///
/// Providers are `true`, an options object, or absent/`false`.
fn provided(capabilities: &Value, key: &str) -> bool {
    !matches!(
        capabilities.get(key),
        None | Some(Value::Null | Value::Bool(false))
    )
}

fn supports(capabilities: &Value, method: Request) -> bool {
    let key = match method {
        Request::Navigate(Method::Declaration) => "declarationProvider",
        Request::Navigate(Method::Definition) => "definitionProvider",
        Request::Navigate(Method::TypeDefinition) => "typeDefinitionProvider",
        Request::Navigate(Method::Implementation) => "implementationProvider",
        Request::Navigate(Method::References) => "referencesProvider",
        Request::Navigate(Method::DocumentSymbol) => "documentSymbolProvider",
        Request::Navigate(Method::WorkspaceSymbol) => "workspaceSymbolProvider",
        Request::Navigate(Method::IncomingCalls | Method::OutgoingCalls)
        | Request::PrepareCallHierarchy => "callHierarchyProvider",
        Request::WorkspaceSymbolResolve => {
            return capabilities
                .get("workspaceSymbolProvider")
                .and_then(|provider| provider.get("resolveProvider"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
        }
    };
    provided(capabilities, key)
}
