//! WebSocket event dispatch.
//!
//! Event handlers are wired to every upgraded connection uniformly: the
//! connection's receive loop translates protocol frames into [`WsEvent`]s
//! and asks the process-wide [`EventMap`] to dispatch each one. There is
//! no per-connection filtering of event names.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{trace, warn};
use uuid::Uuid;
use waypost_types::BoxFuture;

/// Payload carried by a `message` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Text(String),
    Binary(Vec<u8>),
}

/// A named protocol event on an upgraded connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    Open,
    Message(EventPayload),
    Close,
}

impl WsEvent {
    /// The event name handlers register under.
    pub fn name(&self) -> &'static str {
        match self {
            WsEvent::Open => "open",
            WsEvent::Message(_) => "message",
            WsEvent::Close => "close",
        }
    }

    fn into_payload(self) -> Option<EventPayload> {
        match self {
            WsEvent::Message(payload) => Some(payload),
            WsEvent::Open | WsEvent::Close => None,
        }
    }
}

/// A frame queued for delivery to the connection's peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// Handle to one upgraded connection, given to event handlers.
///
/// Cloneable; sends are queued on an unbounded channel drained by the
/// connection's writer task, so a handler never blocks on a slow peer.
#[derive(Clone)]
pub struct WsConn {
    id: Uuid,
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl WsConn {
    /// Create a connection handle plus the receiving end its writer task
    /// drains.
    pub fn channel(id: Uuid) -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a text frame. Returns false if the connection is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.tx.send(OutboundFrame::Text(text.into())).is_ok()
    }

    /// Queue a binary frame. Returns false if the connection is gone.
    pub fn send_binary(&self, data: Vec<u8>) -> bool {
        self.tx.send(OutboundFrame::Binary(data)).is_ok()
    }

    /// Ask the writer task to close the connection.
    pub fn close(&self) {
        let _ = self.tx.send(OutboundFrame::Close);
    }
}

impl fmt::Debug for WsConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsConn").field("id", &self.id).finish()
    }
}

/// A WebSocket event handler: invoked with the connection and, for
/// message-carrying events, the payload.
#[derive(Clone)]
pub struct EventHandler(Arc<dyn Fn(WsConn, Option<EventPayload>) -> BoxFuture<()> + Send + Sync>);

impl EventHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(WsConn, Option<EventPayload>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Arc::new(move |conn, payload| Box::pin(f(conn, payload))))
    }

    pub fn call(&self, conn: WsConn, payload: Option<EventPayload>) -> BoxFuture<()> {
        (self.0)(conn, payload)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

/// The process-wide event name → handler table, built once by the route
/// compiler from the reserved event module.
#[derive(Debug, Clone, Default)]
pub struct EventMap {
    handlers: HashMap<String, EventHandler>,
}

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Duplicate names are last-writer-wins and
    /// reported; only a single event module per tree is expected.
    pub fn insert(&mut self, name: impl Into<String>, handler: EventHandler) {
        let name = name.into();
        if self
            .handlers
            .insert(name.clone(), handler)
            .is_some()
        {
            warn!(
                target: "waypost::discovery",
                event = %name,
                "Duplicate WebSocket event handler replaced"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&EventHandler> {
        self.handlers.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Registered event names, for startup logging.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch one protocol event to its registered handler, if any.
    /// Unregistered events are a no-op.
    pub async fn dispatch(&self, conn: WsConn, event: WsEvent) {
        let name = event.name();
        match self.handlers.get(name) {
            Some(handler) => handler.call(conn, event.into_payload()).await,
            None => {
                trace!(target: "waypost::ws", event = name, "No handler registered for event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_handler(log: Arc<Mutex<Vec<String>>>, tag: &'static str) -> EventHandler {
        EventHandler::new(move |_conn, payload| {
            let log = log.clone();
            async move {
                let entry = match payload {
                    Some(EventPayload::Text(t)) => format!("{tag}:{t}"),
                    Some(EventPayload::Binary(b)) => format!("{tag}:{} bytes", b.len()),
                    None => tag.to_string(),
                };
                log.lock().unwrap().push(entry);
            }
        })
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_event_name() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventMap::new();
        events.insert("open", recording_handler(log.clone(), "open"));
        events.insert("message", recording_handler(log.clone(), "message"));
        events.insert("close", recording_handler(log.clone(), "close"));

        let (conn, _rx) = WsConn::channel(Uuid::new_v4());
        events.dispatch(conn.clone(), WsEvent::Open).await;
        events
            .dispatch(
                conn.clone(),
                WsEvent::Message(EventPayload::Text("ping".into())),
            )
            .await;
        events.dispatch(conn, WsEvent::Close).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["open", "message:ping", "close"]
        );
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_event_is_noop() {
        let events = EventMap::new();
        let (conn, _rx) = WsConn::channel(Uuid::new_v4());
        // Must not panic or hang.
        events.dispatch(conn, WsEvent::Open).await;
    }

    #[tokio::test]
    async fn test_handler_can_reply_through_conn() {
        let mut events = EventMap::new();
        events.insert(
            "message",
            EventHandler::new(|conn: WsConn, payload| async move {
                if let Some(EventPayload::Text(t)) = payload {
                    conn.send_text(format!("echo:{t}"));
                }
            }),
        );

        let (conn, mut rx) = WsConn::channel(Uuid::new_v4());
        events
            .dispatch(conn, WsEvent::Message(EventPayload::Text("hi".into())))
            .await;

        assert_eq!(rx.recv().await, Some(OutboundFrame::Text("echo:hi".into())));
    }

    #[test]
    fn test_names_sorted() {
        let mut events = EventMap::new();
        events.insert("message", EventHandler::new(|_c, _p| async {}));
        events.insert("close", EventHandler::new(|_c, _p| async {}));
        assert_eq!(events.names(), vec!["close", "message"]);
    }
}
