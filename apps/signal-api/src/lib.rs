pub mod config;
pub mod routes;
pub mod signaling;

use std::sync::Arc;

use parking_lot::Mutex;

use config::Config;
use signaling::registry::Registry;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<Registry>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
            config: Arc::new(config),
        }
    }
}
