//! Plugin orchestration primitives for the ECA rule engine (Layer 1).
//!
//! `eca_system` provides the host-side scaffolding the rule engine is wired
//! into:
//!
//! - [`api`] - API trait for capability registries
//! - [`plugin`] - Plugin trait, plugin groups and schedule markers
//! - [`resource`] - Global, read-only resources shared by plugins
//! - [`server`] - Server runtime for plugin orchestration
//!
//! # Architecture
//!
//! - **Layer 1** (`eca_system`): plugin orchestration (this crate)
//! - **Layer 2** (`eca_graph`): rule graphs, matching and execution
//! - **Layer 3** (`eca_core_plugins`): infrastructure plugins
//!
//! # Example
//!
//! ```
//! use eca_system::plugin::Plugin;
//! use eca_system::server::Server;
//! use eca_system::resource::GlobalResource;
//!
//! #[derive(Default)]
//! struct SiteConfig { name: String }
//! impl GlobalResource for SiteConfig {}
//!
//! struct SitePlugin;
//!
//! impl Plugin for SitePlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(SiteConfig::default());
//!     }
//! }
//!
//! Server::new()
//!     .add_plugins(SitePlugin)
//!     .run();
//! ```

/// API trait for capability registration.
pub mod api;

/// Plugin trait for extensible functionality.
pub mod plugin;

/// Global resource storage.
pub mod resource;

/// Server runtime for plugin orchestration.
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::api::*;
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
