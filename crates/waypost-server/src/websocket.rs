//! WebSocket connection handling.
//!
//! Each upgraded connection gets its own receive loop that translates
//! protocol frames into named events and hands them to the process-wide
//! event table. Events for one connection are dispatched in order; other
//! connections are never blocked.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use waypost_core::{EventPayload, OutboundFrame, WsConn, WsEvent};

pub async fn serve_connection(socket: WebSocket, state: Arc<AppState>) {
    let events = state.dispatcher.events();
    let conn_id = Uuid::new_v4();
    let (conn, mut outbound) = WsConn::channel(conn_id);
    let (mut ws_tx, mut ws_rx) = socket.split();

    state.register_connection(conn_id);
    info!(
        target: "waypost::ws",
        conn = %conn_id,
        open = state.connection_count(),
        "WebSocket connection opened"
    );

    // Writer task: drains frames queued by event handlers.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let msg = match frame {
                OutboundFrame::Text(text) => Message::Text(text.into()),
                OutboundFrame::Binary(data) => Message::Binary(data.into()),
                OutboundFrame::Close => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            };
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    events.dispatch(conn.clone(), WsEvent::Open).await;

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                events
                    .dispatch(
                        conn.clone(),
                        WsEvent::Message(EventPayload::Text(text.to_string())),
                    )
                    .await;
            }
            Message::Binary(data) => {
                events
                    .dispatch(
                        conn.clone(),
                        WsEvent::Message(EventPayload::Binary(data.to_vec())),
                    )
                    .await;
            }
            Message::Close(_) => {
                debug!(target: "waypost::ws", conn = %conn_id, "Peer closed connection");
                break;
            }
            // Pongs are answered by axum itself.
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    events.dispatch(conn, WsEvent::Close).await;
    send_task.abort();

    let open_for = state.unregister_connection(conn_id);
    info!(
        target: "waypost::ws",
        conn = %conn_id,
        open_for = ?open_for,
        "WebSocket connection closed"
    );
}
