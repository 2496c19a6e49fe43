//! WebSocket upgrade handler and per-connection event loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::AppState;

use super::connection::{ConnRole, Connection};
use super::protocol::ServerMessage;
use super::{lifecycle, routing};

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Per-connection task: drive the read loop, delegate frames to the routing
/// engine, and funnel every exit path through lifecycle close handling.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Outbound queue. Lifecycle and routing code (under the registry lock)
    // enqueue here without blocking; the writer task drains in order, which
    // gives each recipient FIFO delivery.
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let conn = Connection::new(tx);
    let conn_id = conn.conn_id().to_string();

    tracing::info!(%conn_id, "signaling connection open");

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if ws_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut role = ConnRole::Unassigned;
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                routing::dispatch(&state.registry, &conn, &mut role, &text);
            }
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => routing::dispatch(&state.registry, &conn, &mut role, text),
                Err(_) => {
                    tracing::debug!(%conn_id, "binary frame is not valid utf-8");
                    conn.send(&ServerMessage::error("Unrecognized message"));
                }
            },
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(%conn_id, %err, "ws read error");
                break;
            }
        }
    }

    // Clean and unclean closure take the same path.
    {
        let mut registry = state.registry.lock();
        lifecycle::handle_close(&mut registry, &role, conn.conn_id());
    }

    tracing::info!(%conn_id, "signaling connection closed");

    // Close handling removed every registry clone of this connection;
    // dropping ours ends the writer once the queue is flushed.
    drop(conn);
    let _ = writer.await;
}
