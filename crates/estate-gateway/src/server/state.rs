//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::ConnectionManager;
use estate_common::AppConfig;
use estate_core::{LifecycleHandler, PresenceRegistry, TokenVerifier};
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Connection manager for WebSocket connections
    connection_manager: Arc<ConnectionManager>,
    /// Shared lifecycle handler (registry and relay live behind it)
    lifecycle: Arc<LifecycleHandler>,
    /// Verifies the credential presented on upgrade
    verifier: Arc<dyn TokenVerifier>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        lifecycle: LifecycleHandler,
        verifier: Arc<dyn TokenVerifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            connection_manager,
            lifecycle: Arc::new(lifecycle),
            verifier,
            config: Arc::new(config),
        }
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    /// Get the lifecycle handler
    pub fn lifecycle(&self) -> &LifecycleHandler {
        &self.lifecycle
    }

    /// Get the presence registry
    pub fn registry(&self) -> &dyn PresenceRegistry {
        self.lifecycle.relay().registry().as_ref()
    }

    /// Get the token verifier
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.verifier.as_ref()
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("lifecycle", &self.lifecycle)
            .field("config", &"AppConfig")
            .finish_non_exhaustive()
    }
}
