//! In-memory registry of the broadcaster slot and the viewer map.
//!
//! A single `Registry` instance lives in `AppState` behind one
//! `parking_lot::Mutex`; every lifecycle transition and routing decision runs
//! inside one critical section on it, so the registry is never observed in an
//! inconsistent intermediate state. Nothing here blocks and nothing here does
//! I/O — callers enqueue outbound messages on connection handles.

use std::collections::HashMap;

use super::connection::Connection;

/// Broadcaster slot plus viewerId → connection map. No persistence; torn
/// down with the process.
#[derive(Default)]
pub struct Registry {
    broadcaster: Option<Connection>,
    viewers: HashMap<String, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `conn` as the broadcaster, returning the displaced incumbent
    /// (if any) so the caller can notify and close it.
    pub fn set_broadcaster(&mut self, conn: Connection) -> Option<Connection> {
        self.broadcaster.replace(conn)
    }

    /// Clear the broadcaster slot, but only if it is still held by
    /// `conn_id`. Guards against a stale close event racing a takeover.
    /// Returns whether the slot was cleared.
    pub fn remove_broadcaster(&mut self, conn_id: &str) -> bool {
        match &self.broadcaster {
            Some(current) if current.conn_id() == conn_id => {
                self.broadcaster = None;
                true
            }
            _ => false,
        }
    }

    pub fn broadcaster(&self) -> Option<&Connection> {
        self.broadcaster.as_ref()
    }

    pub fn has_broadcaster(&self) -> bool {
        self.broadcaster.is_some()
    }

    /// Insert a viewer. The caller guarantees `viewer_id` is fresh.
    pub fn add_viewer(&mut self, viewer_id: String, conn: Connection) {
        self.viewers.insert(viewer_id, conn);
    }

    /// Remove a viewer if present. Idempotent: removing an unknown id is a
    /// no-op and returns `None`.
    pub fn remove_viewer(&mut self, viewer_id: &str) -> Option<Connection> {
        self.viewers.remove(viewer_id)
    }

    pub fn viewer(&self, viewer_id: &str) -> Option<&Connection> {
        self.viewers.get(viewer_id)
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    pub fn viewer_ids(&self) -> impl Iterator<Item = &str> {
        self.viewers.keys().map(String::as_str)
    }

    pub fn viewers(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.viewers.iter().map(|(id, conn)| (id.as_str(), conn))
    }

    /// Empty the viewer map, yielding every entry so the caller can cascade
    /// a broadcast-ended notice to each.
    pub fn drain_viewers(&mut self) -> Vec<(String, Connection)> {
        self.viewers.drain().collect()
    }
}
