//! Shared application state.

use crate::config::Config;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;
use waypost_core::{compile, walk, Dispatcher, ModuleSource};
use waypost_types::{Handler, RouteResponse};

/// Book-keeping for one live WebSocket connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnMeta {
    pub opened_at: Instant,
}

/// Shared application state.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Live upgraded connections, keyed by connection id.
    pub connections: DashMap<Uuid, ConnMeta>,
    pub config: Config,
}

impl AppState {
    /// Build the route table from `source` and wire a dispatcher with the
    /// stock 404 default handler.
    pub fn new(config: Config, source: &dyn ModuleSource) -> Self {
        Self::with_default(config, source, stock_default_handler())
    }

    /// Same as [`AppState::new`] but with an embedder-supplied default
    /// handler for unmatched requests.
    pub fn with_default(config: Config, source: &dyn ModuleSource, default_handler: Handler) -> Self {
        let table = compile(walk(source));
        let dispatcher = Arc::new(Dispatcher::new(
            table,
            default_handler,
            config.cache_capacity,
        ));
        Self {
            dispatcher,
            connections: DashMap::new(),
            config,
        }
    }

    pub fn register_connection(&self, id: Uuid) {
        self.connections.insert(
            id,
            ConnMeta {
                opened_at: Instant::now(),
            },
        );
    }

    /// Remove a closed connection; returns how long it was open.
    pub fn unregister_connection(&self, id: Uuid) -> Option<Duration> {
        self.connections
            .remove(&id)
            .map(|(_, meta)| meta.opened_at.elapsed())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

fn stock_default_handler() -> Handler {
    Handler::new(|_req, _params| async { RouteResponse::not_found() })
}
