//! Common test helpers and utilities.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lsp_nav_source::error::LspError;
use lsp_nav_source::lsp::LspResult;
use lsp_nav_source::lsp::client::LspClient;
use lsp_nav_source::source::{BufferId, Host, LanguageClient, Method, Request, WindowId};
use serde_json::{Value, json};
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const BUFFER: BufferId = BufferId(1);
pub const WINDOW: WindowId = WindowId(1000);

/// A request as the scripted client received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Request,
    pub params: Value,
}

/// In-memory language client answering from a script.
///
/// Unscripted requests get no answer at all. Call hierarchy requests are
/// answered by the name of the item they are made for; unknown names get
/// an empty list.
#[derive(Default)]
pub struct ScriptedClient {
    detached: bool,
    unsupported: Vec<Request>,
    failing: Vec<Request>,
    responses: HashMap<Request, Option<Vec<Value>>>,
    calls: HashMap<String, Value>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// No server attached to any buffer.
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Servers attached, none supporting `method`.
    pub fn unsupported(mut self, method: Request) -> Self {
        self.unsupported.push(method);
        self
    }

    /// Transport failure on `method`.
    pub fn failing(mut self, method: Request) -> Self {
        self.failing.push(method);
        self
    }

    /// One result per responder.
    pub fn respond(mut self, method: impl Into<Request>, results: Vec<Value>) -> Self {
        self.responses.insert(method.into(), Some(results));
        self
    }

    /// The servers attached but nobody answered.
    pub fn silent(mut self, method: impl Into<Request>) -> Self {
        self.responses.insert(method.into(), None);
        self
    }

    /// Calls answer for the item named `name`.
    pub fn calls(mut self, name: &str, calls: Value) -> Self {
        self.calls.insert(name.to_string(), calls);
        self
    }

    /// Shared view of the requests received so far.
    pub fn log(&self) -> Arc<Mutex<Vec<Recorded>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl LanguageClient for ScriptedClient {
    async fn supports_method(&self, _buffer: BufferId, method: Request) -> Option<bool> {
        if self.detached {
            return None;
        }
        Some(!self.unsupported.contains(&method))
    }

    async fn request(
        &self,
        _buffer: BufferId,
        method: Request,
        params: Value,
    ) -> LspResult<Option<Vec<Value>>> {
        self.requests.lock().unwrap().push(Recorded {
            method,
            params: params.clone(),
        });

        if self.failing.contains(&method) {
            return Err(LspError::RequestFailed("connection reset".to_string()));
        }

        if matches!(
            method,
            Request::Navigate(Method::IncomingCalls | Method::OutgoingCalls)
        ) {
            let name = params["item"]["name"].as_str().unwrap_or_default();
            let calls = self.calls.get(name).cloned().unwrap_or_else(|| json!([]));
            return Ok(Some(vec![calls]));
        }

        Ok(self.responses.get(&method).cloned().flatten())
    }
}

/// Requests of `method` received so far.
pub fn sent(log: &Arc<Mutex<Vec<Recorded>>>, method: impl Into<Request>) -> Vec<Value> {
    let method = method.into();
    log.lock()
        .unwrap()
        .iter()
        .filter(|recorded| recorded.method == method)
        .map(|recorded| recorded.params.clone())
        .collect()
}

/// A host with a fixed buffer name and cursor.
pub struct StaticHost {
    pub path: Option<String>,
    pub cursor: Option<(u32, u32)>,
}

impl StaticHost {
    pub fn new(path: &str, line: u32, column: u32) -> Self {
        Self {
            path: Some(path.to_string()),
            cursor: Some((line, column)),
        }
    }
}

#[async_trait]
impl Host for StaticHost {
    async fn buffer_path(&self, _buffer: BufferId) -> Option<String> {
        self.path.clone()
    }

    async fn cursor(&self, _window: WindowId) -> Option<(u32, u32)> {
        self.cursor
    }
}

/// Log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Captures debug-and-above events of the current thread until the guard
/// is dropped.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

pub fn range(line: u32, character: u32) -> Value {
    json!({
        "start": { "line": line, "character": character },
        "end": { "line": line, "character": character + 4 },
    })
}

pub fn location(uri: &str, line: u32) -> Value {
    json!({ "uri": uri, "range": range(line, 0) })
}

pub fn call_item(name: &str, line: u32) -> Value {
    json!({
        "name": name,
        "kind": 12,
        "uri": "file:///tmp/project/src/lib.rs",
        "range": range(line, 0),
        "selectionRange": range(line, 3),
    })
}

/// Helper to get the fixture project path
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_project")
}

/// Helper to find rust-analyzer executable
pub fn find_rust_analyzer() -> String {
    if let Ok(path) = std::env::var("RUST_ANALYZER_PATH") {
        return path;
    }

    if let Ok(output) = std::process::Command::new("rust-analyzer")
        .arg("--version")
        .output()
        && output.status.success()
    {
        return "rust-analyzer".to_string();
    }

    // Default fallback
    "rust-analyzer".to_string()
}

/// Helper to create and initialize LSP client for tests
pub async fn setup_client() -> LspClient {
    // CI environments need longer timeouts due to slower hardware
    let (init_timeout, request_timeout, index_wait) = if std::env::var("CI").is_ok() {
        (
            Duration::from_secs(120),
            Duration::from_secs(60),
            Duration::from_millis(8000),
        )
    } else {
        (
            Duration::from_secs(60),
            Duration::from_secs(30),
            Duration::from_millis(2000),
        )
    };

    let client = LspClient::builder()
        .server_command(find_rust_analyzer())
        .workspace_root(fixture_path())
        .init_timeout(init_timeout)
        .request_timeout(request_timeout)
        .build()
        .await
        .expect("Failed to start LSP client");

    // Give rust-analyzer time to fully index the workspace
    tokio::time::sleep(index_wait).await;

    client
}

/// Helper to open a file in the LSP client
pub async fn open_file(client: &LspClient, relative_path: &str) -> PathBuf {
    let path = fixture_path().join(relative_path);
    client.did_open(&path).await.expect("Failed to open file");

    let process_wait = if std::env::var("CI").is_ok() {
        Duration::from_millis(3000)
    } else {
        Duration::from_millis(500)
    };
    tokio::time::sleep(process_wait).await;

    path
}
