//! Inbound message decoding, role preconditions, and dispatch.
//!
//! One inbound frame is one transition: `dispatch` decodes the frame,
//! verifies the sender's role permits the message, then takes the registry
//! lock once and performs the whole action inside that critical section.
//! Precondition failures and malformed payloads go back to the sender as an
//! `error` message; the connection stays open and nobody else is affected.

use parking_lot::Mutex;

use super::connection::{ConnRole, Connection};
use super::lifecycle;
use super::protocol::{ClientMessage, Role, ServerMessage};
use super::registry::Registry;

/// Decode and act on one inbound text frame from `conn`.
///
/// `role` is the connection task's own role state; registration is the only
/// message that mutates it.
pub fn dispatch(registry: &Mutex<Registry>, conn: &Connection, role: &mut ConnRole, text: &str) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::debug!(conn_id = %conn.conn_id(), %err, "unparseable message");
            conn.send(&ServerMessage::error("Unrecognized message"));
            return;
        }
    };

    match msg {
        ClientMessage::Register { role: wanted } => handle_register(registry, conn, role, wanted),
        ClientMessage::Offer { viewer_id, sdp } => {
            if *role != ConnRole::Broadcaster {
                conn.send(&ServerMessage::error("Only the broadcaster may send offers"));
                return;
            }
            let registry = registry.lock();
            match registry.viewer(&viewer_id) {
                Some(viewer) => viewer.send(&ServerMessage::Offer { viewer_id, sdp }),
                None => {
                    // Stale target: tell the broadcaster, nobody else.
                    tracing::debug!(%viewer_id, "offer for unknown viewer");
                    conn.send(&ServerMessage::ViewerMissing { viewer_id });
                }
            }
        }
        ClientMessage::Answer { viewer_id, sdp } => {
            let ConnRole::Viewer { viewer_id: own_id } = role else {
                conn.send(&ServerMessage::error("Only viewers may send answers"));
                return;
            };
            if viewer_id != *own_id {
                conn.send(&ServerMessage::error(
                    "viewerId does not match this connection",
                ));
                return;
            }
            let registry = registry.lock();
            match registry.broadcaster() {
                Some(broadcaster) => broadcaster.send(&ServerMessage::Answer { viewer_id, sdp }),
                None => tracing::debug!(%viewer_id, "answer dropped, no broadcaster"),
            }
        }
        ClientMessage::Candidate {
            viewer_id,
            candidate,
            origin,
        } => handle_candidate(registry, conn, role, viewer_id, candidate, origin),
        ClientMessage::Stop => {
            if *role != ConnRole::Broadcaster {
                conn.send(&ServerMessage::error(
                    "Only the broadcaster may stop the broadcast",
                ));
                return;
            }
            let mut registry = registry.lock();
            // A stop racing a takeover is stale: only the connection holding
            // the slot may end the broadcast. Same class as the guarded
            // remove_broadcaster, so it is dropped, not errored.
            let holds_slot = registry
                .broadcaster()
                .is_some_and(|b| b.conn_id() == conn.conn_id());
            if !holds_slot {
                tracing::debug!(conn_id = %conn.conn_id(), "stop from displaced broadcaster");
                return;
            }
            lifecycle::handle_stop(&mut registry, conn);
        }
    }
}

fn handle_register(
    registry: &Mutex<Registry>,
    conn: &Connection,
    role: &mut ConnRole,
    wanted: Role,
) {
    // A connection registers exactly once; the role never changes after.
    if *role != ConnRole::Unassigned {
        conn.send(&ServerMessage::error("Already registered"));
        return;
    }

    let mut registry = registry.lock();
    match wanted {
        Role::Broadcaster => {
            lifecycle::register_broadcaster(&mut registry, conn);
            *role = ConnRole::Broadcaster;
        }
        Role::Viewer => {
            let viewer_id = lifecycle::register_viewer(&mut registry, conn);
            *role = ConnRole::Viewer { viewer_id };
        }
    }
}

fn handle_candidate(
    registry: &Mutex<Registry>,
    conn: &Connection,
    role: &ConnRole,
    viewer_id: String,
    candidate: serde_json::Value,
    origin: Role,
) {
    match (origin, role) {
        (Role::Broadcaster, ConnRole::Broadcaster) => {
            let registry = registry.lock();
            match registry.viewer(&viewer_id) {
                Some(viewer) => viewer.send(&ServerMessage::Candidate {
                    viewer_id,
                    candidate,
                    origin,
                }),
                None => tracing::debug!(%viewer_id, "candidate dropped, unknown viewer"),
            }
        }
        (Role::Viewer, ConnRole::Viewer { viewer_id: own_id }) => {
            // Addressed with the sender's own id, whatever the client sent.
            let viewer_id = own_id.clone();
            let registry = registry.lock();
            match registry.broadcaster() {
                Some(broadcaster) => broadcaster.send(&ServerMessage::Candidate {
                    viewer_id,
                    candidate,
                    origin,
                }),
                None => tracing::debug!(%viewer_id, "candidate dropped, no broadcaster"),
            }
        }
        _ => {
            conn.send(&ServerMessage::error(
                "Candidate origin does not match sender role",
            ));
        }
    }
}
