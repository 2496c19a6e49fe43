//! Connection handle and per-connection role state.

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use solocast_common::id::{prefix, prefixed_ulid};

use super::protocol::ServerMessage;

/// The role state machine of one connection: `Unassigned → Broadcaster |
/// Viewer`. Assigned exactly once, on the first valid register message; there
/// is no transition back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnRole {
    Unassigned,
    Broadcaster,
    Viewer { viewer_id: String },
}

/// Handle to one live WebSocket connection.
///
/// Holds the sending half of the connection's outbound queue; the connection
/// task drains the queue in order and writes frames to the socket, so sends
/// enqueued here are delivered FIFO per connection. Cloned into the registry
/// so lifecycle and routing code can address the peer.
#[derive(Debug, Clone)]
pub struct Connection {
    conn_id: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            conn_id: prefixed_ulid(prefix::CONNECTION),
            tx,
        }
    }

    /// Opaque identifier for logging and the stale-close guard.
    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    /// Serialize `msg` and enqueue it for delivery.
    ///
    /// A send to a connection whose task has already gone away is a silent
    /// no-op: close events race message delivery by design, and a message
    /// that arrives too late is not an error.
    pub fn send(&self, msg: &ServerMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            let _ = self.tx.send(Message::Text(json.into()));
        }
    }

    /// Enqueue a close frame; the connection task terminates after writing it.
    pub fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn channel_conn() -> (Connection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(tx), rx)
    }

    #[test]
    fn conn_ids_are_prefixed_and_unique() {
        let (a, _rx_a) = channel_conn();
        let (b, _rx_b) = channel_conn();
        assert!(a.conn_id().starts_with("conn_"));
        assert_ne!(a.conn_id(), b.conn_id());
    }

    #[test]
    fn send_delivers_serialized_text_frame() {
        let (conn, mut rx) = channel_conn();
        conn.send(&ServerMessage::Stopped);

        let msg = rx.try_recv().expect("frame enqueued");
        let Message::Text(text) = msg else {
            panic!("expected text frame");
        };
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "stopped");
    }

    #[test]
    fn send_after_receiver_dropped_is_a_no_op() {
        let (conn, rx) = channel_conn();
        drop(rx);
        // Must not panic or error.
        conn.send(&ServerMessage::Stopped);
        conn.close();
    }

    #[test]
    fn close_enqueues_close_frame() {
        let (conn, mut rx) = channel_conn();
        conn.close();
        assert!(matches!(rx.try_recv(), Ok(Message::Close(_))));
    }
}
