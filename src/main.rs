//! lsp-nav-source - Entry Point
//!
//! Runs one gather against a spawned language server and prints the batch
//! as JSON lines on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lsp_nav_source::config::{self, GatherConfig};
use lsp_nav_source::lsp::client::LspClient;
use lsp_nav_source::source::{
    BufferId, FileHost, GatherArgs, Item, NavigationTarget, Source, WindowId,
};

const BUFFER: BufferId = BufferId(1);
const WINDOW: WindowId = WindowId(1000);

/// Semantic navigation results from a language server, as selectable items.
#[derive(Parser, Debug)]
#[command(name = "lsp-nav-source")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Navigation method, e.g. `textDocument/references`.
    #[arg(short, long)]
    method: Option<String>,

    /// Query for `workspace/symbol`.
    #[arg(short, long)]
    query: Option<String>,

    /// File the request is made from.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Cursor line (1-indexed).
    #[arg(long, default_value_t = 1)]
    line: u32,

    /// Cursor column (1-indexed).
    #[arg(long, default_value_t = 1)]
    column: u32,

    /// JSON configuration file; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workspace root directory.
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Language server command to use.
    #[arg(short, long)]
    language_server: Option<String>,

    /// Arguments to pass to the language server.
    #[arg(long)]
    language_server_args: Vec<String>,

    /// Levels of call hierarchy to expand below the roots.
    #[arg(long, default_value_t = 0)]
    depth: u32,

    /// Resolve deferred workspace symbol ranges before printing.
    #[arg(long)]
    resolve: bool,

    /// Milliseconds to let the server index before the request.
    #[arg(long, default_value_t = 0)]
    index_wait_ms: u64,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Parses the log level string into a tracing Level.
    fn parse_log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!("invalid log level: {}", other),
        }
    }

    /// Loads the configuration file, if any, and applies the flags on top.
    fn gather_config(&self) -> Result<GatherConfig> {
        let mut config = match &self.config {
            Some(path) => config::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => GatherConfig::default(),
        };
        if let Some(method) = &self.method {
            config.params.method.clone_from(method);
        }
        if let Some(query) = &self.query {
            config.params.query.clone_from(query);
        }
        if let Some(server) = &self.language_server {
            config.language_server.clone_from(server);
        }
        if !self.language_server_args.is_empty() {
            config.language_server_args.clone_from(&self.language_server_args);
        }
        Ok(config)
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lsp_nav_source={level},tower={level},async_lsp={level}"
        ))
    });

    // stdout carries the items
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}

fn print_item(item: &Item) -> Result<()> {
    let line = serde_json::to_string(item).context("failed to serialize item")?;
    println!("{line}");
    Ok(())
}

/// Replaces a deferred target by the resolved location, when resolvable.
async fn resolve_item(source: &Source, mut item: Item) -> Item {
    if let NavigationTarget::Deferred { path, request } = &item.action
        && let Some(range) = source.resolve(BUFFER, request).await
    {
        item.action = NavigationTarget::Location {
            path: path.clone(),
            range,
        };
    }
    item
}

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.parse_log_level()?;
    init_tracing(log_level)?;

    let config = args.gather_config()?;

    let workspace = args.workspace.canonicalize().context(format!(
        "failed to canonicalize workspace path: {}",
        args.workspace.display()
    ))?;

    info!(
        workspace = %workspace.display(),
        language_server = %config.language_server,
        method = %config.params.method,
        "starting gather"
    );

    let client = LspClient::builder()
        .server_command(&config.language_server)
        .server_args(config.language_server_args.clone())
        .workspace_root(&workspace)
        .build()
        .await
        .context("failed to start LSP client")?;
    let client = Arc::new(client);

    let file = args.file.clone().unwrap_or_else(|| workspace.clone());
    if args.file.is_some() {
        client
            .did_open(&file)
            .await
            .context("failed to open document")?;
    }
    if args.index_wait_ms > 0 {
        tokio::time::sleep(Duration::from_millis(args.index_wait_ms)).await;
    }

    let host = FileHost::new(file, args.line, args.column);
    let source = Source::new(client.clone(), Arc::new(host));

    let mut gather_args = GatherArgs::new(BUFFER, WINDOW, config.params.method.clone());
    gather_args.params = config.params.clone();
    gather_args.options = config.options;

    let mut batches = source.gather(gather_args.clone()).boxed();
    let mut frontier = Vec::new();
    while let Some(batch) = batches.next().await {
        for item in batch {
            let item = if args.resolve {
                resolve_item(&source, item).await
            } else {
                item
            };
            print_item(&item)?;
            frontier.push(item);
        }
    }
    drop(batches);

    for _ in 0..args.depth {
        let mut next = Vec::new();
        for parent in frontier.iter().filter(|item| item.is_tree == Some(true)) {
            let Some(node) = parent.node else { continue };
            let expand = gather_args.clone().expand(node);
            let children: Vec<Vec<Item>> = source.gather(expand).collect().await;
            for child in children.into_iter().flatten() {
                print_item(&child)?;
                next.push(child);
            }
        }
        frontier = next;
    }

    client.shutdown().await.context("failed to shut down language server")?;
    info!("gather finished");

    Ok(())
}
