//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::MatchRegistry;
use crate::session::SessionCoordinator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<SessionCoordinator>,
    pub match_registry: Arc<MatchRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize match registry
        let match_registry = Arc::new(MatchRegistry::new());

        // Session coordinator owns the queue and routes into the registry
        let coordinator = Arc::new(SessionCoordinator::new(
            match_registry.clone(),
            config.match_command_buffer,
        ));

        Self {
            config,
            coordinator,
            match_registry,
        }
    }
}
