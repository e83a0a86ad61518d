//! Axum wiring: every request funnels through the dispatcher.

use crate::state::AppState;
use crate::websocket;
use axum::body::{to_bytes, Body};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use waypost_core::ModuleSource;
use waypost_types::{RouteRequest, RouteResponse};

/// Upper bound on buffered request bodies (2 MiB). Bodies are passed to
/// handlers as opaque bytes, never parsed.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the axum application. A single fallback receives every request;
/// there are no framework-level routes to shadow the module tree.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_any)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Walk and compile the module source, then serve until the listener dies.
pub async fn run(config: crate::config::Config, source: &dyn ModuleSource) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), source));
    tracing::info!(
        target: "waypost::startup",
        routes = state.dispatcher.route_count(),
        events = ?state.dispatcher.events().names(),
        "Route table ready"
    );

    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "waypost::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_any(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let (mut parts, body) = req.into_parts();

    let mut route_req = RouteRequest::new(parts.method.as_str(), parts.uri.path());
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            route_req
                .headers
                .push((name.as_str().to_string(), v.to_string()));
        }
    }

    if state.dispatcher.is_upgrade(&route_req) {
        // The handshake itself belongs to the transport; route matching is
        // skipped entirely for upgrade requests.
        return match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(upgrade) => upgrade
                .on_upgrade(move |socket| websocket::serve_connection(socket, state))
                .into_response(),
            Err(rejection) => rejection.into_response(),
        };
    }

    match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => route_req.body = bytes.to_vec(),
        Err(e) => {
            warn!(target: "waypost::dispatch", error = %e, "Failed to buffer request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    }

    let res = state.dispatcher.dispatch(route_req).await;
    into_axum_response(res)
}

fn into_axum_response(res: RouteResponse) -> Response {
    let status = StatusCode::from_u16(res.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &res.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            builder = builder.header(name, value);
        }
    }
    builder
        .body(Body::from(res.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
