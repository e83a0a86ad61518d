//! Request-time resolution: cache, scan, tie-break, invoke.

use crate::cache::{Resolved, ResolutionCache};
use crate::compiler::RouteTable;
use crate::events::EventMap;
use crate::matcher::match_path;
use std::sync::Arc;
use tracing::{debug, info};
use waypost_types::{Handler, Method, Params, RouteEntry, RouteRequest, RouteResponse};

/// Resolves each request to exactly one handler and runs it.
///
/// Owns the immutable route table and event map for the process lifetime.
/// The only mutable state on the hot path is the resolution cache.
pub struct Dispatcher {
    routes: Vec<Arc<RouteEntry>>,
    events: Arc<EventMap>,
    cache: ResolutionCache,
    default_handler: Handler,
}

impl Dispatcher {
    pub fn new(table: RouteTable, default_handler: Handler, cache_capacity: usize) -> Self {
        Self {
            routes: table.routes,
            events: Arc::new(table.events),
            cache: ResolutionCache::new(cache_capacity),
            default_handler,
        }
    }

    /// Whether the request asks to convert the connection to a WebSocket.
    ///
    /// Upgrade requests bypass route matching entirely; the transport
    /// performs the handshake and hands the connection to the event
    /// fan-out.
    pub fn is_upgrade(&self, req: &RouteRequest) -> bool {
        req.header("upgrade")
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false)
    }

    /// The event table applied to every upgraded connection.
    pub fn events(&self) -> Arc<EventMap> {
        self.events.clone()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Resolve and run the handler for a standard (non-upgrade) request.
    ///
    /// Cache first, then a full scan with the tie-break rule; no match
    /// falls back to the default handler without touching the cache.
    /// Whatever the handler produces is awaited and returned unmodified.
    pub async fn dispatch(&self, req: RouteRequest) -> RouteResponse {
        let Some(method) = Method::parse(&req.method) else {
            debug!(
                target: "waypost::dispatch",
                method = %req.method,
                path = %req.path,
                "Unrecognized method; using default handler"
            );
            return self.default_handler.call(req, Params::new()).await;
        };

        if let Some(hit) = self.cache.lookup(&req.path, method) {
            debug!(
                target: "waypost::dispatch",
                method = %method,
                path = %req.path,
                route = %hit.entry.pattern,
                "Resolved from cache"
            );
            return hit.entry.handler.call(req, hit.params).await;
        }

        match self.resolve(method, &req.path) {
            Some((entry, params)) => {
                debug!(
                    target: "waypost::dispatch",
                    method = %method,
                    path = %req.path,
                    route = %entry.pattern,
                    "Resolved by scan"
                );
                self.cache.insert(
                    &req.path,
                    method,
                    Resolved {
                        entry: entry.clone(),
                        params: params.clone(),
                    },
                );
                entry.handler.call(req, params).await
            }
            None => {
                info!(
                    target: "waypost::dispatch",
                    method = %method,
                    path = %req.path,
                    "No route matched"
                );
                self.default_handler.call(req, Params::new()).await
            }
        }
    }

    /// Scan the route table and apply the tie-break rule.
    fn resolve(&self, method: Method, path: &str) -> Option<(Arc<RouteEntry>, Params)> {
        let mut matches: Vec<(Arc<RouteEntry>, Params)> = self
            .routes
            .iter()
            .filter(|route| route.method == method)
            .filter_map(|route| {
                match_path(&route.pattern, path).map(|params| (route.clone(), params))
            })
            .collect();

        if matches.len() > 1 {
            // Prefer the route whose filename stem equals the request's
            // trailing segment; otherwise first in scan order. This is
            // the observed behavior, kept as documented.
            let tail = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
            if let Some(pos) = matches.iter().position(|(entry, _)| entry.pattern.base() == tail) {
                return Some(matches.swap_remove(pos));
            }
        }
        matches.into_iter().next()
    }

    #[cfg(test)]
    pub(crate) fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }
}
