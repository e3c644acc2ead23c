//! Core infrastructure plugins for the ECA engine.
//!
//! - [`TracingPlugin`] - Logging via the `tracing` crate
//! - [`DispatchLogPlugin`] - Audit trail of dispatches and action executions
//! - [`DefaultPlugins`] - The engine plus both infrastructure plugins
//!
//! # Example
//!
//! ```no_run
//! use eca_system::server::Server;
//! use eca_system::plugin::PluginGroup;
//! use eca_core_plugins::DefaultPlugins;
//!
//! let mut server = Server::new();
//! server.add_plugins(DefaultPlugins.build());
//! server.run();
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`eca_system`): plugin orchestration
//! - **Layer 2** (`eca_graph`): rule graphs and execution
//! - **Layer 3** (`eca_core_plugins`): infrastructure plugins (this crate)

mod dispatch_log;
mod tracing_plugin;

pub use dispatch_log::{DispatchLogPlugin, DispatchStats};
pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use eca_graph::plugin::EcaPlugin;
use eca_system::plugin::{PluginGroup, PluginGroupBuilder};

/// Default plugins for most hosts.
///
/// Includes:
/// - [`EcaPlugin`] - Engine APIs with the default configuration
/// - [`TracingPlugin`] - Logging
/// - [`DispatchLogPlugin`] - Audit trail
///
/// # Customization
///
/// ```ignore
/// server.add_plugins(
///     DefaultPlugins
///         .build()
///         .disable::<TracingPlugin>()
/// );
/// ```
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(EcaPlugin::default())
            .add(TracingPlugin::default())
            .add(DispatchLogPlugin)
    }
}
