// Application state module
// Shared state handed to every connection task

use std::sync::atomic::AtomicBool;

use crate::registry::MountRegistry;
use crate::server::ServerControl;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Live mount table, read by dispatch and mutated by the management API
    pub registry: MountRegistry,
    /// Archive listener lifecycle (start/stop)
    pub server: ServerControl,

    // Cached config value for lock-free access on the request path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            registry: MountRegistry::new(),
            server: ServerControl::new(),
            cached_access_log,
        }
    }
}
