//! Waypost server - file-tree routed HTTP/WebSocket server.

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use waypost_core::{EventHandler, StaticModules, WsConn};
use waypost_server::{app, config::Config, logging};
use waypost_types::{Handler, Params, RouteRequest, RouteResponse};

use logging::{LogConfig, LogFormat};

/// Waypost server - resolves requests against a module namespace.
#[derive(Parser, Debug)]
#[command(name = "waypost-server")]
#[command(about = "File-tree routed HTTP/WebSocket server")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override listen host from config
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "dispatch=debug").
    /// Can be specified multiple times. Targets are prefixed with
    /// "waypost::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    tracing::info!(target: "waypost::startup", "Loaded configuration (port: {})", config.port);

    // The stock binary serves the built-in demo namespace; embedders
    // register their own modules (or an FsModules tree rooted at
    // `routes_dir`) through the library API.
    let modules = builtin_modules();
    app::run(config, &modules).await
}

/// The built-in demo namespace: a root index, an echo route, and an echo
/// WebSocket event module.
fn builtin_modules() -> StaticModules {
    let mut modules = StaticModules::new();

    modules.module("index").route(
        "default",
        Handler::new(|_req: RouteRequest, _params| async move {
            RouteResponse::json(
                200,
                &json!({
                    "service": "waypost",
                    "version": env!("CARGO_PKG_VERSION"),
                }),
            )
        }),
    );

    modules.module("echo/[word]").route(
        "GET",
        Handler::new(|req: RouteRequest, params: Params| async move {
            RouteResponse::json(
                200,
                &json!({
                    "path": req.path,
                    "word": params.get("word"),
                }),
            )
        }),
    );

    modules
        .module("+ws")
        .event(
            "open",
            EventHandler::new(|conn: WsConn, _payload| async move {
                conn.send_text("hello");
            }),
        )
        .event(
            "message",
            EventHandler::new(|conn: WsConn, payload| async move {
                if let Some(waypost_core::EventPayload::Text(text)) = payload {
                    conn.send_text(text);
                }
            }),
        );

    modules
}
