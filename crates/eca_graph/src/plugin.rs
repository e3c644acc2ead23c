//! Server plugin publishing the engine APIs.
//!
//! [`EcaPlugin`] makes the engine available to other plugins:
//!
//! - [`EngineConfig`] as a global resource
//! - [`HooksAPI`] for lifecycle hooks
//! - [`PluginRegistry`] with the standard gateway registered
//!
//! # Setup
//!
//! ```ignore
//! let mut server = Server::new();
//! server.add_plugins(EcaPlugin::default().with_config(
//!     EngineConfig::default().with_recursion_threshold(5),
//! ));
//! server.add_plugins(ArticleRulesPlugin);
//! server.finish();
//!
//! let registry = server.api::<PluginRegistry>().expect("registry");
//! let mut processor = Processor::from_server(&server);
//! processor.load_definition(&definition, registry)?;
//! processor.process(&event, server.api::<HooksAPI>());
//! ```

use eca_system::plugin::Plugin;
use eca_system::server::Server;

use crate::config::EngineConfig;
use crate::hooks::HooksAPI;
use crate::registry::PluginRegistry;

/// Publishes [`EngineConfig`], [`HooksAPI`] and [`PluginRegistry`].
///
/// APIs already inserted by another plugin are kept.
#[derive(Debug, Clone, Default)]
pub struct EcaPlugin {
    config: EngineConfig,
}

impl EcaPlugin {
    /// Sets the engine configuration.
    ///
    /// # Panics
    ///
    /// [`Plugin::build`] panics if the configuration does not pass
    /// [`EngineConfig::validate`].
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for EcaPlugin {
    fn build(&self, server: &mut Server) {
        if let Err(err) = self.config.validate() {
            panic!("EcaPlugin received an invalid engine configuration: {err}");
        }
        server.insert_global(self.config.clone());

        if !server.contains_api::<HooksAPI>() {
            server.insert_api(HooksAPI::new());
        }
        if !server.contains_api::<PluginRegistry>() {
            server.insert_api(PluginRegistry::with_standard_gateways());
        }

        tracing::debug!(
            recursion_threshold = self.config.recursion_threshold,
            history_capacity = self.config.history_capacity,
            "ECA engine APIs published"
        );
    }
}
