//! Session lifecycle: registration, disconnect cascades, stop, and
//! viewer-count fanout.
//!
//! Every function here runs with the registry lock held by the caller and
//! performs a complete transition — all registry mutations and all outbound
//! enqueues — before returning. Enqueues never block, so nothing awaits under
//! the lock.

use solocast_common::id::{prefix, prefixed_ulid};

use super::connection::{ConnRole, Connection};
use super::protocol::ServerMessage;
use super::registry::Registry;

/// Register `conn` as the broadcaster.
///
/// If a broadcaster is already live it is displaced: notified, then forcibly
/// closed — the one case where the server unilaterally terminates a peer. The
/// newcomer receives its confirmation followed by one `viewer-joined` per
/// registered viewer so it can immediately start offering toward each.
pub fn register_broadcaster(registry: &mut Registry, conn: &Connection) {
    if let Some(displaced) = registry.set_broadcaster(conn.clone()) {
        tracing::info!(
            old_conn_id = %displaced.conn_id(),
            new_conn_id = %conn.conn_id(),
            "broadcaster takeover"
        );
        displaced.send(&ServerMessage::error("Replaced by a new broadcaster"));
        displaced.close();
    }

    tracing::info!(conn_id = %conn.conn_id(), "broadcaster registered");
    conn.send(&ServerMessage::registered_broadcaster());

    for viewer_id in registry.viewer_ids() {
        conn.send(&ServerMessage::ViewerJoined {
            viewer_id: viewer_id.to_string(),
        });
    }
}

/// Register `conn` as a viewer and return its freshly generated identifier.
pub fn register_viewer(registry: &mut Registry, conn: &Connection) -> String {
    let viewer_id = prefixed_ulid(prefix::VIEWER);
    let has_broadcaster = registry.has_broadcaster();
    registry.add_viewer(viewer_id.clone(), conn.clone());

    tracing::info!(conn_id = %conn.conn_id(), %viewer_id, "viewer registered");
    conn.send(&ServerMessage::registered_viewer(
        viewer_id.clone(),
        has_broadcaster,
    ));

    if let Some(broadcaster) = registry.broadcaster() {
        broadcaster.send(&ServerMessage::ViewerJoined {
            viewer_id: viewer_id.clone(),
        });
    }

    broadcast_viewer_count(registry);
    viewer_id
}

/// Handle the broadcaster's channel closing.
///
/// A close from a broadcaster already displaced by takeover is stale: the
/// guarded removal fails and nothing cascades. Otherwise every viewer is told
/// the broadcast ended and disconnected, and the viewer map is cleared —
/// viewers re-register against a future broadcaster.
pub fn handle_broadcaster_close(registry: &mut Registry, conn_id: &str) {
    if !registry.remove_broadcaster(conn_id) {
        return;
    }

    tracing::info!(%conn_id, "broadcaster disconnected");
    end_broadcast(registry);
    broadcast_viewer_count(registry);
}

/// Handle a viewer's channel closing. Removing an id already gone (swept by
/// a broadcast-ended cascade) is a no-op with no notifications.
pub fn handle_viewer_close(registry: &mut Registry, viewer_id: &str) {
    if registry.remove_viewer(viewer_id).is_none() {
        return;
    }

    tracing::info!(%viewer_id, "viewer disconnected");
    if let Some(broadcaster) = registry.broadcaster() {
        broadcaster.send(&ServerMessage::ViewerLeft {
            viewer_id: viewer_id.to_string(),
        });
    }

    broadcast_viewer_count(registry);
}

/// Route a channel close through the transition matching the connection's
/// role. Unassigned connections left no registry trace.
pub fn handle_close(registry: &mut Registry, role: &ConnRole, conn_id: &str) {
    match role {
        ConnRole::Broadcaster => handle_broadcaster_close(registry, conn_id),
        ConnRole::Viewer { viewer_id } => handle_viewer_close(registry, viewer_id),
        ConnRole::Unassigned => {}
    }
}

/// Explicit stop from the broadcaster: same viewer-facing cascade as a
/// broadcaster close, but the broadcaster keeps its slot and its channel —
/// it may start a new broadcast later without reconnecting.
pub fn handle_stop(registry: &mut Registry, conn: &Connection) {
    tracing::info!(conn_id = %conn.conn_id(), "broadcast stopped");
    end_broadcast(registry);
    conn.send(&ServerMessage::Stopped);
    broadcast_viewer_count(registry);
}

/// Tell every viewer the broadcast ended, close each viewer channel, and
/// clear the viewer map.
fn end_broadcast(registry: &mut Registry) {
    for (_, viewer) in registry.drain_viewers() {
        viewer.send(&ServerMessage::BroadcasterEnded);
        viewer.close();
    }
}

/// Fan the current viewer count out to every viewer and the broadcaster.
pub fn broadcast_viewer_count(registry: &Registry) {
    let msg = ServerMessage::ViewerCount {
        count: registry.viewer_count(),
    };
    for (_, viewer) in registry.viewers() {
        viewer.send(&msg);
    }
    if let Some(broadcaster) = registry.broadcaster() {
        broadcaster.send(&msg);
    }
}
